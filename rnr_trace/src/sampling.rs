//! Recording policy: what reaches the trace and what is dropped.
//!
//! Pose kinds are rate limited. Action states are written on edges only:
//! while `changed` holds, plus the single settle sample that follows.

use crate::domain::XrTime;

/// Minimum spacing between two admitted pose samples, 8 ms.
pub const DEFAULT_MIN_SAMPLE_INTERVAL: XrTime = 8_000_000;

/// Rate limiter over runtime time.
#[derive(Debug, Clone)]
pub struct PoseSampler {
    min_interval: XrTime,
    last: Option<XrTime>,
}

impl Default for PoseSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SAMPLE_INTERVAL)
    }
}

impl PoseSampler {
    pub fn new(min_interval: XrTime) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Admit the sample at `time` if strictly more than the minimum
    /// interval has passed since the last admitted one.
    pub fn admit(&mut self, time: XrTime) -> bool {
        let admitted = match self.last {
            None => true,
            Some(last) => time.saturating_sub(last) > self.min_interval,
        };
        if admitted {
            self.last = Some(time);
        }
        admitted
    }
}

/// Edge detector over `changed` flags.
///
/// One filter serves every key of a kind: the previous flag is shared,
/// so a changing action can let through the settle sample of another.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    previous_changed: bool,
}

impl EdgeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, changed: bool) -> bool {
        let admitted = changed || self.previous_changed;
        self.previous_changed = changed;
        admitted
    }
}
