//! RECORD-side policy in front of the trace writer.
//!
//! Decides which live samples reach the trace:
//!   - locations: rate limited per (frame, base frame) pair
//!   - views: rate limited per view set, all eyes written together
//!   - action states: edge filtered, one shared filter per kind
//!   - haptics and reference frame creation: always written
//!
//! Write failures never reach the caller; they are logged and the sample
//! is dropped.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use rnr_trace::domain::{
    ActionBoolean, ActionFloat, ActionVector2, Haptic, Location, Pose, ReferenceSpace, TraceBody,
    TraceEntry, View, XrTime,
};
use rnr_trace::sampling::{EdgeFilter, PoseSampler, DEFAULT_MIN_SAMPLE_INTERVAL};

use crate::trace_store::{StoreError, TraceWriter};

pub struct Recorder {
    writer: TraceWriter,
    min_interval: XrTime,
    location_samplers: HashMap<(String, String), PoseSampler>,
    view_sampler: PoseSampler,
    float_edges: EdgeFilter,
    vector2_edges: EdgeFilter,
    boolean_edges: EdgeFilter,
    dropped: u64,
}

impl Recorder {
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(TraceWriter::create(path)?))
    }

    pub fn new(writer: TraceWriter) -> Self {
        let min_interval = DEFAULT_MIN_SAMPLE_INTERVAL;
        Self {
            writer,
            min_interval,
            location_samplers: HashMap::new(),
            view_sampler: PoseSampler::new(min_interval),
            float_edges: EdgeFilter::new(),
            vector2_edges: EdgeFilter::new(),
            boolean_edges: EdgeFilter::new(),
            dropped: 0,
        }
    }

    /// Offer a successful space location. Returns whether it was written.
    pub fn record_location(&mut self, time: XrTime, space: &str, base: &str, pose: Pose) -> bool {
        let min_interval = self.min_interval;
        let admitted = self
            .location_samplers
            .entry((space.to_string(), base.to_string()))
            .or_insert_with(|| PoseSampler::new(min_interval))
            .admit(time);
        if !admitted {
            return false;
        }
        self.write(TraceEntry::new(
            time,
            space,
            TraceBody::Location(Location {
                pose,
                base_space: base.to_string(),
            }),
        ))
    }

    /// Offer a located view set. Each view is written with its position in
    /// `views` as index. Returns the number of lines written.
    pub fn record_views(
        &mut self,
        time: XrTime,
        space: &str,
        view_configuration: u32,
        views: &[View],
    ) -> usize {
        if views.is_empty() || !self.view_sampler.admit(time) {
            return 0;
        }
        let mut written = 0;
        for (index, view) in views.iter().enumerate() {
            let view = View {
                view_configuration,
                index: index as u32,
                ..view.clone()
            };
            if self.write(TraceEntry::new(time, space, TraceBody::View(view))) {
                written += 1;
            }
        }
        written
    }

    pub fn record_float(&mut self, time: XrTime, path: &str, state: ActionFloat) -> bool {
        if !self.float_edges.admit(state.changed) {
            return false;
        }
        self.write(TraceEntry::new(time, path, TraceBody::ActionFloat(state)))
    }

    pub fn record_vector2(&mut self, time: XrTime, path: &str, state: ActionVector2) -> bool {
        if !self.vector2_edges.admit(state.changed) {
            return false;
        }
        self.write(TraceEntry::new(time, path, TraceBody::ActionVector2(state)))
    }

    pub fn record_boolean(&mut self, time: XrTime, path: &str, state: ActionBoolean) -> bool {
        if !self.boolean_edges.admit(state.changed) {
            return false;
        }
        self.write(TraceEntry::new(time, path, TraceBody::ActionBoolean(state)))
    }

    pub fn record_haptic(&mut self, time: XrTime, path: &str, fired: bool) -> bool {
        self.write(TraceEntry::new(
            time,
            path,
            TraceBody::Haptic(Haptic { fired }),
        ))
    }

    pub fn record_reference_space(&mut self, time: XrTime, name: &str, pose: Pose) -> bool {
        self.write(TraceEntry::new(
            time,
            name,
            TraceBody::ReferenceSpace(ReferenceSpace {
                pose,
                kind: name.to_string(),
            }),
        ))
    }

    fn write(&mut self, entry: TraceEntry) -> bool {
        match self.writer.append(&entry) {
            Ok(()) => true,
            Err(err) => {
                self.dropped += 1;
                warn!(
                    key = %entry.key,
                    kind = %entry.kind(),
                    error = %err,
                    "trace entry dropped"
                );
                false
            }
        }
    }

    pub fn entries_written(&self) -> u64 {
        self.writer.entries_written()
    }

    /// Entries that passed the policy but failed to write.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.writer.close()
    }
}
