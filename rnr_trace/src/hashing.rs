//! Trace digest: SHA-256 over the canonical line encoding.
//!
//! Times are rebased on the first entry, so two traces recorded at
//! different wall-clock offsets but with identical content share a digest.

use sha2::{Digest, Sha256};

use crate::codec::{encode_line, CodecError};
use crate::domain::TraceEntry;

/// Canonical lines: encoded relative to the first entry, newline-terminated.
pub fn canonical_serialize<'a, I>(entries: I) -> Result<Vec<u8>, CodecError>
where
    I: IntoIterator<Item = &'a TraceEntry>,
{
    let mut out = Vec::new();
    let mut origin = None;
    for entry in entries {
        let base = *origin.get_or_insert(entry.time);
        let relative = entry
            .time
            .checked_sub(base)
            .ok_or_else(|| CodecError::Invalid {
                field: "time",
                value: entry.time.to_string(),
            })?;
        out.extend_from_slice(encode_line(entry, relative)?.as_bytes());
        out.push(b'\n');
    }
    Ok(out)
}

/// Lowercase hex SHA-256 of the canonical serialization.
pub fn trace_digest<'a, I>(entries: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a TraceEntry>,
{
    let bytes = canonical_serialize(entries)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Haptic, TraceBody};

    fn pulses(offset: i64) -> Vec<TraceEntry> {
        [(0, true), (10, false), (25, true)]
            .into_iter()
            .map(|(t, fired)| {
                TraceEntry::new(
                    offset + t,
                    "/user/hand/left/output/haptic",
                    TraceBody::Haptic(Haptic { fired }),
                )
            })
            .collect()
    }

    #[test]
    fn digest_ignores_absolute_offset() {
        let a = trace_digest(&pulses(0)).unwrap();
        let b = trace_digest(&pulses(1_000_000)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn digest_detects_payload_change() {
        let mut changed = pulses(0);
        changed[1].body = TraceBody::Haptic(Haptic { fired: true });
        assert_ne!(
            trace_digest(&pulses(0)).unwrap(),
            trace_digest(&changed).unwrap()
        );
    }

    #[test]
    fn unrepresentable_spread_is_an_error() {
        let mut entries = pulses(0);
        entries[0].time = i64::MIN;
        entries[1].time = i64::MAX;
        assert!(matches!(
            trace_digest(&entries),
            Err(CodecError::Invalid { field: "time", .. })
        ));
    }

    #[test]
    fn canonical_lines_are_rebased() {
        let bytes = canonical_serialize(&pulses(500)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("0 h /user/hand/left/output/haptic 1\n"));
        assert!(text.ends_with("25 h /user/hand/left/output/haptic 1\n"));
    }
}
