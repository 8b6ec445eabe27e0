//! Forward-only replay cursor over a trace.
//!
//! The cursor reads the trace incrementally as replay time advances and
//! keeps, per composite key, the latest entry at or before the most recent
//! target time. Each line is read and parsed exactly once; the first entry
//! beyond the target is held as a one-entry lookahead until time catches up.
//!
//! Time rebasing: a stored time `t` replays at
//! `t - record_origin + replay_origin`, where `record_origin` is the first
//! parsed line's stored time and `replay_origin` the first target time
//! (unless set explicitly). Relative spacing is preserved.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use rnr_trace::codec::{decode_line, CodecError};
use rnr_trace::domain::{
    ActionBoolean, ActionFloat, ActionVector2, Haptic, IndexKey, Location, RecordKind,
    ReferenceSpace, TraceEntry, View, XrTime,
};
use rnr_trace::index::EntryIndex;

use crate::trace_store::StoreError;

pub struct TraceCursor<R = BufReader<File>> {
    reader: R,
    lookahead: Option<TraceEntry>,
    watermark: Option<XrTime>,
    replay_origin: Option<XrTime>,
    record_origin: Option<XrTime>,
    index: EntryIndex,
    lines_read: u64,
    lines_skipped: u64,
    exhausted: bool,
}

impl TraceCursor<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceCursor<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            lookahead: None,
            watermark: None,
            replay_origin: None,
            record_origin: None,
            index: EntryIndex::new(),
            lines_read: 0,
            lines_skipped: 0,
            exhausted: false,
        }
    }

    /// Pin the replay time that corresponds to the first recorded entry.
    /// Without it, the first target passed to `advance_to` is used.
    /// Ignored once reading has started.
    pub fn set_replay_origin(&mut self, origin: XrTime) {
        if self.replay_origin.is_none() {
            self.replay_origin = Some(origin);
        } else {
            warn!(origin, "replay origin already fixed");
        }
    }

    /// Consume every entry at or before `target`.
    ///
    /// Returns `false` when the trace ran out before reaching `target`:
    /// replay has exhausted the capture. Landing exactly on the last
    /// entry's time still succeeds; any other target past the end fails.
    pub fn advance_to(&mut self, target: XrTime) -> bool {
        let replay_origin = *self.replay_origin.get_or_insert(target);

        loop {
            let entry = match self.lookahead.take() {
                Some(entry) => entry,
                None => match self.next_entry(replay_origin) {
                    Some(entry) => entry,
                    None => return self.watermark == Some(target),
                },
            };

            if entry.time > target {
                self.lookahead = Some(entry);
                return true;
            }

            self.watermark = Some(entry.time);
            self.index.insert(entry);
        }
    }

    /// Next decodable entry, rebased into replay time.
    fn next_entry(&mut self, replay_origin: XrTime) -> Option<TraceEntry> {
        if self.exhausted {
            return None;
        }

        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    debug!(lines = self.lines_read, "end of trace");
                    self.exhausted = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "trace read failed, treating as end of trace");
                    self.exhausted = true;
                    return None;
                }
            }
            self.lines_read += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                self.skip(CodecError::Invalid {
                    field: "line",
                    value: String::from_utf8_lossy(&buf).into_owned(),
                });
                continue;
            };

            match decode_line(line) {
                Ok(mut entry) => {
                    let record_origin = *self.record_origin.get_or_insert(entry.time);
                    match rebase(entry.time, record_origin, replay_origin) {
                        Some(time) => {
                            entry.time = time;
                            return Some(entry);
                        }
                        None => self.skip(CodecError::Invalid {
                            field: "time",
                            value: entry.time.to_string(),
                        }),
                    }
                }
                Err(CodecError::Empty) => continue,
                Err(err) => self.skip(err),
            }
        }
    }

    fn skip(&mut self, err: CodecError) {
        self.lines_skipped += 1;
        warn!(line = self.lines_read, error = %err, "skipping malformed trace line");
    }

    /// Latest entry for `key` at or before `target`.
    pub fn query_latest(&mut self, key: &IndexKey, target: XrTime) -> Option<&TraceEntry> {
        if !self.advance_to(target) {
            return None;
        }
        self.index.get(key)
    }

    pub fn latest_location(&mut self, path: &str, base: &str, target: XrTime) -> Option<&Location> {
        self.query_latest(&IndexKey::location(path, base), target)
            .and_then(|e| e.body.as_location())
    }

    pub fn latest_view(&mut self, path: &str, index: u32, target: XrTime) -> Option<&View> {
        self.query_latest(&IndexKey::view(path, index), target)
            .and_then(|e| e.body.as_view())
    }

    pub fn latest_float(&mut self, path: &str, target: XrTime) -> Option<&ActionFloat> {
        self.query_latest(&IndexKey::path_only(RecordKind::ActionFloat, path), target)
            .and_then(|e| e.body.as_action_float())
    }

    pub fn latest_vector2(&mut self, path: &str, target: XrTime) -> Option<&ActionVector2> {
        self.query_latest(&IndexKey::path_only(RecordKind::ActionVector2, path), target)
            .and_then(|e| e.body.as_action_vector2())
    }

    pub fn latest_boolean(&mut self, path: &str, target: XrTime) -> Option<&ActionBoolean> {
        self.query_latest(&IndexKey::path_only(RecordKind::ActionBoolean, path), target)
            .and_then(|e| e.body.as_action_boolean())
    }

    pub fn latest_haptic(&mut self, path: &str, target: XrTime) -> Option<&Haptic> {
        self.query_latest(&IndexKey::path_only(RecordKind::Haptic, path), target)
            .and_then(|e| e.body.as_haptic())
    }

    pub fn latest_reference_space(
        &mut self,
        path: &str,
        target: XrTime,
    ) -> Option<&ReferenceSpace> {
        self.query_latest(&IndexKey::path_only(RecordKind::ReferenceSpace, path), target)
            .and_then(|e| e.body.as_reference_space())
    }

    /// Rebased time of the latest consumed entry.
    pub fn watermark(&self) -> Option<XrTime> {
        self.watermark
    }

    pub fn replay_origin(&self) -> Option<XrTime> {
        self.replay_origin
    }

    pub fn index(&self) -> &EntryIndex {
        &self.index
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }

    /// True once the end of the trace has been reached and nothing is pending.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.lookahead.is_none()
    }
}

/// `None` when the rebased time does not fit the clock.
fn rebase(time: XrTime, record_origin: XrTime, replay_origin: XrTime) -> Option<XrTime> {
    time.checked_sub(record_origin)?.checked_add(replay_origin)
}
