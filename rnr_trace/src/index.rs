//! Query index: latest entry per composite key.
//!
//! Keys order by record kind first, so each kind occupies its own
//! contiguous partition of the map.

use std::collections::BTreeMap;

use crate::domain::{IndexKey, RecordKind, TraceEntry};

#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    latest: BTreeMap<IndexKey, TraceEntry>,
}

impl EntryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entry` as the latest for its key, returning the one it replaced.
    pub fn insert(&mut self, entry: TraceEntry) -> Option<TraceEntry> {
        self.latest.insert(entry.index_key(), entry)
    }

    pub fn get(&self, key: &IndexKey) -> Option<&TraceEntry> {
        self.latest.get(key)
    }

    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = (&IndexKey, &TraceEntry)> {
        self.latest.iter().filter(move |(key, _)| key.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &TraceEntry)> {
        self.latest.iter()
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fov, Location, Pose, TraceBody, View};

    fn location(time: i64, base: &str, z: f32) -> TraceEntry {
        TraceEntry::new(
            time,
            "/user/hand/left",
            TraceBody::Location(Location {
                pose: Pose::from_position(0.0, 0.0, z),
                base_space: base.to_string(),
            }),
        )
    }

    #[test]
    fn newer_entry_replaces_older_for_same_key() {
        let mut index = EntryIndex::new();
        assert!(index.insert(location(0, "LOCAL", 0.0)).is_none());
        let replaced = index.insert(location(5, "LOCAL", 1.0)).unwrap();
        assert_eq!(replaced.time, 0);
        let latest = index
            .get(&IndexKey::location("/user/hand/left", "LOCAL"))
            .unwrap();
        assert_eq!(latest.time, 5);
    }

    #[test]
    fn base_frame_separates_location_keys() {
        let mut index = EntryIndex::new();
        index.insert(location(0, "LOCAL", 0.0));
        index.insert(location(1, "STAGE", 2.0));
        assert_eq!(index.len(), 2);
        assert_eq!(index.of_kind(RecordKind::Location).count(), 2);
        assert_eq!(index.of_kind(RecordKind::View).count(), 0);
    }

    #[test]
    fn view_index_separates_view_keys() {
        let mut index = EntryIndex::new();
        for i in 0..2 {
            index.insert(TraceEntry::new(
                0,
                "LOCAL",
                TraceBody::View(View {
                    pose: Pose::default(),
                    fov: Fov::default(),
                    view_configuration: 2,
                    index: i,
                }),
            ));
        }
        assert!(index.get(&IndexKey::view("LOCAL", 0)).is_some());
        assert!(index.get(&IndexKey::view("LOCAL", 1)).is_some());
        assert!(index.get(&IndexKey::view("LOCAL", 2)).is_none());
    }
}
