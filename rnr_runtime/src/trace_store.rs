//! Append-only trace store, text encoded, one entry per line.
//!
//! Rules:
//!   - Opened write-truncate; the first appended entry defines time zero
//!   - Strict append only, no seeking, no rewriting
//!   - Flushed and synced when closed
//!
//! Out-of-order entries are written as given and logged; the reader side
//! tolerates them.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use rnr_trace::codec::{decode_line, encode_line, CodecError};
use rnr_trace::domain::{TraceEntry, XrTime};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open trace {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trace I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot encode entry: {0}")]
    Encode(#[from] CodecError),
}

/// RECORD-side handle on the trace file.
pub struct TraceWriter {
    path: PathBuf,
    out: BufWriter<File>,
    origin: Option<XrTime>,
    last_time: Option<XrTime>,
    entries_written: u64,
}

impl TraceWriter {
    /// Create (truncate) the trace file, creating missing parent directories.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        let open_err = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = File::create(path).map_err(open_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            origin: None,
            last_time: None,
            entries_written: 0,
        })
    }

    /// Append one entry, time rebased on the first entry ever appended.
    ///
    /// An entry that fails to encode is not written and does not claim
    /// time zero.
    pub fn append(&mut self, entry: &TraceEntry) -> Result<(), StoreError> {
        let origin = self.origin.unwrap_or(entry.time);
        let relative = entry
            .time
            .checked_sub(origin)
            .ok_or_else(|| CodecError::Invalid {
                field: "time",
                value: entry.time.to_string(),
            })?;
        let line = encode_line(entry, relative)?;

        if let Some(last) = self.last_time {
            if entry.time < last {
                warn!(
                    key = %entry.key,
                    kind = %entry.kind(),
                    time = entry.time,
                    last,
                    "trace entry appended out of time order"
                );
            }
        }

        writeln!(self.out, "{}", line)?;
        self.origin = Some(origin);
        self.last_time = Some(self.last_time.map_or(entry.time, |t| t.max(entry.time)));
        self.entries_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush, sync and release the file.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        debug!(
            path = %self.path.display(),
            entries = self.entries_written,
            "trace closed"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }
}

/// Load every decodable entry of a trace, times as stored.
/// Malformed lines are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<TraceEntry>, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match decode_line(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!(line = number + 1, error = %err, "skipping malformed trace line"),
        }
    }
    Ok(entries)
}
