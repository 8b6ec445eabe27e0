//! Offline replay: rebuild query state from a whole trace.
//!
//! Unlike the cursor, these helpers load the full trace up front. They
//! serve inspection and verification, never the per-call replay path.

use std::path::Path;

use rnr_trace::domain::{TraceEntry, XrTime};
use rnr_trace::hashing::trace_digest;
use rnr_trace::index::EntryIndex;

use crate::trace_store::{read_entries, StoreError};

/// Index state after consuming every entry at or before `until`,
/// times relative to the first entry.
pub fn rebuild_index(entries: &[TraceEntry], until: XrTime) -> EntryIndex {
    let origin = entries.first().map_or(0, |e| e.time);
    let mut index = EntryIndex::new();
    for entry in entries {
        if entry.time.saturating_sub(origin) > until {
            break;
        }
        index.insert(entry.clone());
    }
    index
}

/// Index state of the whole trace.
pub fn rebuild_final_index(entries: &[TraceEntry]) -> EntryIndex {
    let mut index = EntryIndex::new();
    for entry in entries {
        index.insert(entry.clone());
    }
    index
}

/// Digest of the trace file's decodable content.
pub fn file_digest(path: &Path) -> Result<String, StoreError> {
    let entries = read_entries(path)?;
    Ok(trace_digest(&entries)?)
}
