//! Line codec: one trace entry per line of text.
//!
//! Layout: `<time> <kind> <key> <fields...>`, fields separated by any
//! run of whitespace. Field order per kind:
//!
//!   s  ox oy oz ow px py pz basespace
//!   v  ox oy oz ow px py pz up right down left viewConfig viewIndex
//!   f  changed active lastChanged value
//!   p  changed active lastChanged x y
//!   b  changed active lastChanged value
//!   h  fired
//!   r  ox oy oz ow px py pz kindName
//!
//! Flags are `0|1`. Floats use shortest round-trip formatting.

use std::fmt::Write as _;
use std::str::{FromStr, SplitWhitespace};

use thiserror::Error;

use crate::domain::{
    ActionBoolean, ActionFloat, ActionVector2, Fov, Haptic, Location, Pose, Quaternion,
    RecordKind, ReferenceSpace, TraceBody, TraceEntry, Vector2, Vector3, View, XrTime,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("empty line")]
    Empty,

    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("invalid value {value:?} for field `{field}`")]
    Invalid { field: &'static str, value: String },

    #[error("unknown record kind {0:?}")]
    UnknownKind(String),

    #[error("{0} unexpected trailing field(s)")]
    Trailing(usize),

    #[error("key {0:?} is empty or contains whitespace")]
    BadKey(String),

    #[error("name {0:?} in field `{1}` is empty or contains whitespace")]
    BadName(String, &'static str),
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode an entry with its time replaced by `relative_time`.
pub fn encode_line(entry: &TraceEntry, relative_time: XrTime) -> Result<String, CodecError> {
    if !is_token(&entry.key) {
        return Err(CodecError::BadKey(entry.key.clone()));
    }

    let mut line = format!("{} {} {}", relative_time, entry.kind(), entry.key);
    // Writing into a String cannot fail.
    match &entry.body {
        TraceBody::Location(l) => {
            check_name(&l.base_space, "basespace")?;
            push_pose(&mut line, &l.pose);
            let _ = write!(line, " {}", l.base_space);
        }
        TraceBody::View(v) => {
            push_pose(&mut line, &v.pose);
            let fov = &v.fov;
            let _ = write!(
                line,
                " {} {} {} {} {} {}",
                fov.angle_up,
                fov.angle_right,
                fov.angle_down,
                fov.angle_left,
                v.view_configuration,
                v.index
            );
        }
        TraceBody::ActionFloat(f) => {
            push_action_head(&mut line, f.changed, f.is_active, f.last_changed);
            let _ = write!(line, " {}", f.value);
        }
        TraceBody::ActionVector2(p) => {
            push_action_head(&mut line, p.changed, p.is_active, p.last_changed);
            let _ = write!(line, " {} {}", p.value.x, p.value.y);
        }
        TraceBody::ActionBoolean(b) => {
            push_action_head(&mut line, b.changed, b.is_active, b.last_changed);
            let _ = write!(line, " {}", flag(b.value));
        }
        TraceBody::Haptic(h) => {
            let _ = write!(line, " {}", flag(h.fired));
        }
        TraceBody::ReferenceSpace(r) => {
            check_name(&r.kind, "kindName")?;
            push_pose(&mut line, &r.pose);
            let _ = write!(line, " {}", r.kind);
        }
    }
    Ok(line)
}

fn push_pose(line: &mut String, pose: &Pose) {
    let o = &pose.orientation;
    let p = &pose.position;
    let _ = write!(
        line,
        " {} {} {} {} {} {} {}",
        o.x, o.y, o.z, o.w, p.x, p.y, p.z
    );
}

fn push_action_head(line: &mut String, changed: bool, is_active: bool, last_changed: XrTime) {
    let _ = write!(line, " {} {} {}", flag(changed), flag(is_active), last_changed);
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

fn check_name(name: &str, field: &'static str) -> Result<(), CodecError> {
    if is_token(name) {
        Ok(())
    } else {
        Err(CodecError::BadName(name.to_string(), field))
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode one line. The returned entry carries the time as stored.
pub fn decode_line(line: &str) -> Result<TraceEntry, CodecError> {
    let mut fields = Fields::new(line);
    let time: XrTime = match fields.tokens.next() {
        Some(raw) => raw.parse().map_err(|_| invalid("time", raw))?,
        None => return Err(CodecError::Empty),
    };

    let kind_raw = fields.next("kind")?;
    let kind = single_char(kind_raw)
        .and_then(RecordKind::from_char)
        .ok_or_else(|| CodecError::UnknownKind(kind_raw.to_string()))?;
    let key = fields.next("key")?.to_string();

    let body = match kind {
        RecordKind::Location => {
            let pose = fields.pose()?;
            let base_space = fields.next("basespace")?.to_string();
            TraceBody::Location(Location { pose, base_space })
        }
        RecordKind::View => {
            let pose = fields.pose()?;
            let fov = Fov {
                angle_up: fields.parse("angleUp")?,
                angle_right: fields.parse("angleRight")?,
                angle_down: fields.parse("angleDown")?,
                angle_left: fields.parse("angleLeft")?,
            };
            TraceBody::View(View {
                pose,
                fov,
                view_configuration: fields.parse("viewConfigType")?,
                index: fields.parse("viewIndex")?,
            })
        }
        RecordKind::ActionFloat => TraceBody::ActionFloat(ActionFloat {
            changed: fields.flag("changed")?,
            is_active: fields.flag("isActive")?,
            last_changed: fields.parse("lastChangedTime")?,
            value: fields.parse("value")?,
        }),
        RecordKind::ActionVector2 => TraceBody::ActionVector2(ActionVector2 {
            changed: fields.flag("changed")?,
            is_active: fields.flag("isActive")?,
            last_changed: fields.parse("lastChangedTime")?,
            value: Vector2 {
                x: fields.parse("x")?,
                y: fields.parse("y")?,
            },
        }),
        RecordKind::ActionBoolean => TraceBody::ActionBoolean(ActionBoolean {
            changed: fields.flag("changed")?,
            is_active: fields.flag("isActive")?,
            last_changed: fields.parse("lastChangedTime")?,
            value: fields.flag("value")?,
        }),
        RecordKind::Haptic => TraceBody::Haptic(Haptic {
            fired: fields.flag("fired")?,
        }),
        RecordKind::ReferenceSpace => {
            let pose = fields.pose()?;
            let kind = fields.next("kindName")?.to_string();
            TraceBody::ReferenceSpace(ReferenceSpace { pose, kind })
        }
    };

    fields.finish()?;
    Ok(TraceEntry { time, key, body })
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn invalid(field: &'static str, value: &str) -> CodecError {
    CodecError::Invalid {
        field,
        value: value.to_string(),
    }
}

struct Fields<'a> {
    tokens: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace(),
        }
    }

    fn next(&mut self, field: &'static str) -> Result<&'a str, CodecError> {
        self.tokens.next().ok_or(CodecError::Missing(field))
    }

    fn parse<T: FromStr>(&mut self, field: &'static str) -> Result<T, CodecError> {
        let raw = self.next(field)?;
        raw.parse().map_err(|_| invalid(field, raw))
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.next(field)? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(invalid(field, other)),
        }
    }

    fn pose(&mut self) -> Result<Pose, CodecError> {
        let orientation = Quaternion {
            x: self.parse("ox")?,
            y: self.parse("oy")?,
            z: self.parse("oz")?,
            w: self.parse("ow")?,
        };
        let position = Vector3 {
            x: self.parse("px")?,
            y: self.parse("py")?,
            z: self.parse("pz")?,
        };
        Ok(Pose {
            orientation,
            position,
        })
    }

    fn finish(mut self) -> Result<(), CodecError> {
        match self.tokens.by_ref().count() {
            0 => Ok(()),
            n => Err(CodecError::Trailing(n)),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
