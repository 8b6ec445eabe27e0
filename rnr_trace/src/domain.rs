//! Core trace types.
//!
//! Pure data. Opaque runtime handles, poses, and the closed set of
//! payload shapes a trace entry can carry. No I/O, no policy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime timestamp, nanoseconds.
pub type XrTime = i64;

/// Name used wherever a handle, frame or action could not be resolved.
pub const UNKNOWN_NAME: &str = "???";

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

handle_type!(
    /// Opaque semantic path handle issued by the runtime.
    PathHandle
);
handle_type!(
    /// Opaque spatial frame (space) handle.
    FrameHandle
);
handle_type!(
    /// Opaque logical input action handle.
    ActionHandle
);

// ── Geometry ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

/// Orientation + position. Defaults to the identity pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub orientation: Quaternion,
    pub position: Vector3,
}

impl Pose {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            orientation: Quaternion::default(),
            position: Vector3 { x, y, z },
        }
    }
}

/// Field of view, four half-angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fov {
    pub angle_up: f32,
    pub angle_right: f32,
    pub angle_down: f32,
    pub angle_left: f32,
}

// ── Payload shapes ─────────────────────────────────────────────────

/// Pose of a frame measured against the named base frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub pose: Pose,
    pub base_space: String,
}

/// One eye of a view set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub pose: Pose,
    pub fov: Fov,
    pub view_configuration: u32,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionFloat {
    pub changed: bool,
    pub is_active: bool,
    pub last_changed: XrTime,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionVector2 {
    pub changed: bool,
    pub is_active: bool,
    pub last_changed: XrTime,
    pub value: Vector2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionBoolean {
    pub changed: bool,
    pub is_active: bool,
    pub last_changed: XrTime,
    pub value: bool,
}

/// `fired` is true for an applied pulse, false for a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Haptic {
    pub fired: bool,
}

/// Creation of a reference frame: its offset pose and kind name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSpace {
    pub pose: Pose,
    pub kind: String,
}

/// Closed set of payload shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceBody {
    Location(Location),
    View(View),
    ActionFloat(ActionFloat),
    ActionVector2(ActionVector2),
    ActionBoolean(ActionBoolean),
    Haptic(Haptic),
    ReferenceSpace(ReferenceSpace),
}

impl TraceBody {
    pub fn kind(&self) -> RecordKind {
        match self {
            TraceBody::Location(_) => RecordKind::Location,
            TraceBody::View(_) => RecordKind::View,
            TraceBody::ActionFloat(_) => RecordKind::ActionFloat,
            TraceBody::ActionVector2(_) => RecordKind::ActionVector2,
            TraceBody::ActionBoolean(_) => RecordKind::ActionBoolean,
            TraceBody::Haptic(_) => RecordKind::Haptic,
            TraceBody::ReferenceSpace(_) => RecordKind::ReferenceSpace,
        }
    }

    pub fn as_location(&self) -> Option<&Location> {
        match self {
            TraceBody::Location(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&View> {
        match self {
            TraceBody::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_action_float(&self) -> Option<&ActionFloat> {
        match self {
            TraceBody::ActionFloat(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_action_vector2(&self) -> Option<&ActionVector2> {
        match self {
            TraceBody::ActionVector2(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_action_boolean(&self) -> Option<&ActionBoolean> {
        match self {
            TraceBody::ActionBoolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_haptic(&self) -> Option<&Haptic> {
        match self {
            TraceBody::Haptic(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_reference_space(&self) -> Option<&ReferenceSpace> {
        match self {
            TraceBody::ReferenceSpace(r) => Some(r),
            _ => None,
        }
    }
}

/// Single-character discriminator written as the second field of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Location,
    View,
    ActionFloat,
    ActionVector2,
    ActionBoolean,
    Haptic,
    ReferenceSpace,
}

impl RecordKind {
    pub const ALL: [RecordKind; 7] = [
        RecordKind::Location,
        RecordKind::View,
        RecordKind::ActionFloat,
        RecordKind::ActionVector2,
        RecordKind::ActionBoolean,
        RecordKind::Haptic,
        RecordKind::ReferenceSpace,
    ];

    pub fn as_char(self) -> char {
        match self {
            RecordKind::Location => 's',
            RecordKind::View => 'v',
            RecordKind::ActionFloat => 'f',
            RecordKind::ActionVector2 => 'p',
            RecordKind::ActionBoolean => 'b',
            RecordKind::Haptic => 'h',
            RecordKind::ReferenceSpace => 'r',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_char() == c)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ── Entries ────────────────────────────────────────────────────────

/// One timestamped record of the trace log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub time: XrTime,
    pub key: String,
    pub body: TraceBody,
}

impl TraceEntry {
    pub fn new(time: XrTime, key: impl Into<String>, body: TraceBody) -> Self {
        Self {
            time,
            key: key.into(),
            body,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.body.kind()
    }

    /// Composite key under which the query index keeps this entry.
    pub fn index_key(&self) -> IndexKey {
        let secondary = match &self.body {
            TraceBody::Location(l) => Secondary::Base(l.base_space.clone()),
            TraceBody::View(v) => Secondary::View(v.index),
            TraceBody::ActionFloat(_)
            | TraceBody::ActionVector2(_)
            | TraceBody::ActionBoolean(_)
            | TraceBody::Haptic(_)
            | TraceBody::ReferenceSpace(_) => Secondary::None,
        };
        IndexKey {
            kind: self.kind(),
            path: self.key.clone(),
            secondary,
        }
    }
}

/// Second component of an index key: base frame for locations,
/// view index for views, nothing otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Secondary {
    None,
    Base(String),
    View(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey {
    pub kind: RecordKind,
    pub path: String,
    pub secondary: Secondary,
}

impl IndexKey {
    pub fn location(path: impl Into<String>, base_space: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Location,
            path: path.into(),
            secondary: Secondary::Base(base_space.into()),
        }
    }

    pub fn view(path: impl Into<String>, index: u32) -> Self {
        Self {
            kind: RecordKind::View,
            path: path.into(),
            secondary: Secondary::View(index),
        }
    }

    /// Key for kinds indexed by path alone.
    pub fn path_only(kind: RecordKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            secondary: Secondary::None,
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Secondary::None => write!(f, "{} {}", self.kind, self.path),
            Secondary::Base(base) => write!(f, "{} {} @{}", self.kind, self.path, base),
            Secondary::View(index) => write!(f, "{} {} #{}", self.kind, self.path, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_chars_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(RecordKind::from_char('x'), None);
    }

    #[test]
    fn body_json_is_tagged_by_type() {
        let entry = TraceEntry::new(
            5,
            "/user/hand/left/output/haptic",
            TraceBody::Haptic(Haptic { fired: true }),
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "time": 5,
                "key": "/user/hand/left/output/haptic",
                "body": { "type": "haptic", "fired": true },
            })
        );
        let back: TraceEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn index_key_separates_secondary() {
        let left = TraceEntry::new(
            0,
            "/user/head",
            TraceBody::View(View {
                pose: Pose::default(),
                fov: Fov::default(),
                view_configuration: 2,
                index: 0,
            }),
        );
        let mut right = left.clone();
        if let TraceBody::View(v) = &mut right.body {
            v.index = 1;
        }
        assert_ne!(left.index_key(), right.index_key());
        assert_eq!(left.index_key(), IndexKey::view("/user/head", 0));
        assert_eq!(right.index_key().to_string(), "v /user/head #1");
    }
}
