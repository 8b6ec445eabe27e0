//! Spatial frame naming.
//!
//! Every frame handle gets one semantic name at creation time: the kind
//! name for reference frames, the matching bound path for action frames.
//! Names are never revisited.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bindings::{ActionBindings, NamingError};
use crate::domain::{ActionHandle, FrameHandle, UNKNOWN_NAME};

/// Closed set of reference frame kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceSpaceKind {
    View,
    Local,
    Stage,
    Other,
}

impl ReferenceSpaceKind {
    /// Map the runtime's enumeration value. Unknown values become `Other`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => ReferenceSpaceKind::View,
            2 => ReferenceSpaceKind::Local,
            3 => ReferenceSpaceKind::Stage,
            _ => ReferenceSpaceKind::Other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReferenceSpaceKind::View => "XR_REFERENCE_SPACE_TYPE_VIEW",
            ReferenceSpaceKind::Local => "XR_REFERENCE_SPACE_TYPE_LOCAL",
            ReferenceSpaceKind::Stage => "XR_REFERENCE_SPACE_TYPE_STAGE",
            ReferenceSpaceKind::Other => "OTHER",
        }
    }

    pub fn from_name(name: &str) -> Self {
        [
            ReferenceSpaceKind::View,
            ReferenceSpaceKind::Local,
            ReferenceSpaceKind::Stage,
        ]
        .into_iter()
        .find(|k| k.name() == name)
        .unwrap_or(ReferenceSpaceKind::Other)
    }
}

impl fmt::Display for ReferenceSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
pub struct FrameNames {
    names: HashMap<FrameHandle, String>,
}

impl FrameNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_reference_frame(&mut self, frame: FrameHandle, kind: ReferenceSpaceKind) -> &str {
        self.assign(frame, kind.name().to_string())
    }

    /// Name an action-bound frame after the bound path matching `sub_path`.
    /// On failure the frame stays unnamed.
    pub fn name_action_frame(
        &mut self,
        frame: FrameHandle,
        action: ActionHandle,
        sub_path: &str,
        bindings: &ActionBindings,
    ) -> Result<&str, NamingError> {
        match bindings.resolve_bound_path(action, sub_path) {
            Ok(path) => Ok(self.assign(frame, path.to_string())),
            Err(err) => {
                warn!(frame = %frame, error = %err, "action frame left untracked");
                Err(err)
            }
        }
    }

    fn assign(&mut self, frame: FrameHandle, name: String) -> &str {
        match self.names.entry(frame) {
            Entry::Occupied(existing) => {
                warn!(
                    frame = %frame,
                    kept = %existing.get(),
                    ignored = %name,
                    "frame already named"
                );
                existing.into_mut()
            }
            Entry::Vacant(slot) => {
                debug!(frame = %frame, name = %name, "frame named");
                slot.insert(name)
            }
        }
    }

    /// Semantic name of `frame`, or the unknown sentinel.
    pub fn name_of(&self, frame: FrameHandle) -> &str {
        match self.names.get(&frame) {
            Some(name) => name,
            None => {
                warn!(frame = %frame, "frame not tracked");
                UNKNOWN_NAME
            }
        }
    }

    pub fn try_name_of(&self, frame: FrameHandle) -> Option<&str> {
        self.names.get(&frame).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
