#![forbid(unsafe_code)]

//! Record & replay runtime for spatial sessions.
//!
//! Owns the trace file and the session lifecycle on top of the pure
//! `rnr_trace` model: the append-only store, the forward-only replay
//! cursor, the recording policy and the session controller, plus offline
//! replay and drift detection for verifying captures.

pub mod config;
pub mod cursor;
pub mod drift;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod trace_store;

pub use config::{ConfigError, Mode, SessionConfig};
pub use cursor::TraceCursor;
pub use recorder::Recorder;
pub use session::{Session, SessionError};
pub use trace_store::{StoreError, TraceWriter};
