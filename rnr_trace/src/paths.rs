//! Semantic path registry: opaque path handles ⇄ stable path strings.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::{PathHandle, UNKNOWN_NAME};

/// Bidirectional handle/string table. Grows monotonically for the
/// lifetime of a session.
#[derive(Debug, Default)]
pub struct PathRegistry {
    by_handle: HashMap<PathHandle, String>,
    by_string: HashMap<String, PathHandle>,
    next_handle: u64,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle previously assigned to `path`, or issue a fresh one.
    pub fn intern(&mut self, path: &str) -> PathHandle {
        if let Some(handle) = self.by_string.get(path) {
            return *handle;
        }

        // Observed runtime handles share the space, so skip any taken value.
        // Zero is the null path; the counter wraps past the top back to 1.
        let mut candidate = PathHandle(self.next_handle.max(1));
        while self.by_handle.contains_key(&candidate) {
            candidate = PathHandle(next_after(candidate.0));
        }
        self.next_handle = next_after(candidate.0);

        self.by_handle.insert(candidate, path.to_string());
        self.by_string.insert(path.to_string(), candidate);
        candidate
    }

    /// Record a handle the live runtime assigned to `path`.
    ///
    /// Returns `false` when either side was already bound to something
    /// else: the string under another handle, or the handle under another
    /// string. That is an anomaly on the runtime side. It is logged, the
    /// stale pairing is dropped from both directions and the newest mapping
    /// is kept, so each handle still names exactly one string.
    pub fn observe(&mut self, path: &str, handle: PathHandle) -> bool {
        let mut consistent = true;

        if let Some(previous) = self.by_string.get(path).copied() {
            if previous != handle {
                warn!(
                    path,
                    previous = %previous,
                    observed = %handle,
                    "same path string resolved to multiple handles"
                );
                self.by_handle.remove(&previous);
                consistent = false;
            }
        }

        if let Some(bound) = self.by_handle.get(&handle) {
            if bound != path {
                warn!(
                    path,
                    bound = %bound,
                    handle = %handle,
                    "path handle rebound to a different string"
                );
                self.by_string.remove(bound.as_str());
                consistent = false;
            }
        }

        self.by_handle.insert(handle, path.to_string());
        self.by_string.insert(path.to_string(), handle);
        consistent
    }

    /// String for `handle`, or the unknown sentinel.
    pub fn name_of(&self, handle: PathHandle) -> &str {
        match self.by_handle.get(&handle) {
            Some(name) => name,
            None => {
                warn!(handle = %handle, "path handle was never interned");
                UNKNOWN_NAME
            }
        }
    }

    pub fn try_name_of(&self, handle: PathHandle) -> Option<&str> {
        self.by_handle.get(&handle).map(String::as_str)
    }

    pub fn handle_of(&self, path: &str) -> Option<PathHandle> {
        self.by_string.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

fn next_after(handle: u64) -> u64 {
    handle.checked_add(1).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut paths = PathRegistry::new();
        let a = paths.intern("/user/hand/left");
        let b = paths.intern("/user/hand/left");
        assert_eq!(a, b);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_handles() {
        let mut paths = PathRegistry::new();
        let left = paths.intern("/user/hand/left");
        let right = paths.intern("/user/hand/right");
        assert_ne!(left, right);
        assert_eq!(paths.name_of(left), "/user/hand/left");
        assert_eq!(paths.name_of(right), "/user/hand/right");
    }

    #[test]
    fn unknown_handle_yields_sentinel() {
        let paths = PathRegistry::new();
        assert_eq!(paths.name_of(PathHandle(42)), UNKNOWN_NAME);
        assert_eq!(paths.try_name_of(PathHandle(42)), None);
    }

    #[test]
    fn interned_handles_avoid_observed_ones() {
        let mut paths = PathRegistry::new();
        assert!(paths.observe("/user/head", PathHandle(1)));
        let fresh = paths.intern("/user/hand/left");
        assert_ne!(fresh, PathHandle(1));
        assert_eq!(paths.intern("/user/head"), PathHandle(1));
    }

    #[test]
    fn conflicting_observation_is_flagged() {
        let mut paths = PathRegistry::new();
        assert!(paths.observe("/user/head", PathHandle(7)));
        assert!(paths.observe("/user/head", PathHandle(7)));
        assert!(!paths.observe("/user/head", PathHandle(9)));
        assert_eq!(paths.handle_of("/user/head"), Some(PathHandle(9)));
        assert_eq!(paths.name_of(PathHandle(9)), "/user/head");
        assert_eq!(paths.try_name_of(PathHandle(7)), None);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn rebinding_a_handle_keeps_both_directions_one_to_one() {
        let mut paths = PathRegistry::new();
        let left = paths.intern("/user/hand/left");
        assert!(!paths.observe("/user/hand/right", left));
        assert_eq!(paths.name_of(left), "/user/hand/right");
        assert_eq!(paths.handle_of("/user/hand/left"), None);

        let again = paths.intern("/user/hand/left");
        assert_ne!(again, left);
        assert_eq!(paths.name_of(again), "/user/hand/left");
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn intern_wraps_past_the_largest_handle() {
        let mut paths = PathRegistry::new();
        assert!(paths.observe("/user/gamepad", PathHandle(u64::MAX)));
        paths.next_handle = u64::MAX;
        let fresh = paths.intern("/user/head");
        assert_eq!(fresh, PathHandle(1));
        assert_eq!(paths.intern("/user/hand/left"), PathHandle(2));
    }
}
