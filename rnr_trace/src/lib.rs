#![forbid(unsafe_code)]

//! Trace model for spatial session record & replay.
//!
//! Pure, deterministic layer: naming tables, the record schemas, the line
//! codec, the query index and the recording policy. No file I/O lives
//! here; see `rnr_runtime` for the store, the cursor and the session.

/// On-disk line format version. Changing field order requires a bump.
pub const TRACE_FORMAT_VERSION: u32 = 1;

pub mod bindings;
pub mod codec;
pub mod domain;
pub mod frames;
pub mod hashing;
pub mod index;
pub mod paths;
pub mod sampling;

pub use bindings::{ActionBindings, NamingError};
pub use codec::{decode_line, encode_line, CodecError};
pub use domain::{
    ActionBoolean, ActionFloat, ActionHandle, ActionVector2, FrameHandle, Fov, Haptic, IndexKey,
    Location, PathHandle, Pose, Quaternion, RecordKind, ReferenceSpace, Secondary, TraceBody,
    TraceEntry, Vector2, Vector3, View, XrTime, UNKNOWN_NAME,
};
pub use frames::{FrameNames, ReferenceSpaceKind};
pub use index::EntryIndex;
pub use paths::PathRegistry;
pub use sampling::{EdgeFilter, PoseSampler, DEFAULT_MIN_SAMPLE_INTERVAL};
