//! Action binding table: logical action → suggested physical paths.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::ActionHandle;

/// Failures to resolve a handle to a semantic name. Never fatal: callers
/// fall back to the unknown sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("action {action} has no binding matching {sub_path:?}")]
    NoBinding {
        action: ActionHandle,
        sub_path: String,
    },
}

#[derive(Debug, Default)]
pub struct ActionBindings {
    bound: HashMap<ActionHandle, Vec<String>>,
}

impl ActionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append paths in suggestion order. Repeated suggestions accumulate.
    pub fn bind<I, S>(&mut self, action: ActionHandle, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bound
            .entry(action)
            .or_default()
            .extend(paths.into_iter().map(Into::into));
    }

    pub fn bound_paths(&self, action: ActionHandle) -> &[String] {
        self.bound.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bound path having `sub_path` as a textual prefix.
    ///
    /// The scan does not stop at the first hit: every match overwrites the
    /// previous one, so the last suggested matching binding wins.
    pub fn resolve_bound_path(
        &self,
        action: ActionHandle,
        sub_path: &str,
    ) -> Result<&str, NamingError> {
        let mut resolved = None;
        for path in self.bound_paths(action) {
            if path.starts_with(sub_path) {
                resolved = Some(path.as_str());
            }
        }
        resolved.ok_or_else(|| NamingError::NoBinding {
            action,
            sub_path: sub_path.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAB: ActionHandle = ActionHandle(1);

    #[test]
    fn last_matching_binding_wins() {
        let mut bindings = ActionBindings::new();
        bindings.bind(
            GRAB,
            ["/user/hand/left/input/a", "/user/hand/left/input/b"],
        );
        assert_eq!(
            bindings.resolve_bound_path(GRAB, "/user/hand/left"),
            Ok("/user/hand/left/input/b")
        );
    }

    #[test]
    fn non_matching_entries_do_not_reset_the_match() {
        let mut bindings = ActionBindings::new();
        bindings.bind(
            GRAB,
            [
                "/user/hand/left/input/squeeze",
                "/user/hand/right/input/squeeze",
            ],
        );
        assert_eq!(
            bindings.resolve_bound_path(GRAB, "/user/hand/left"),
            Ok("/user/hand/left/input/squeeze")
        );
    }

    #[test]
    fn repeated_suggestions_accumulate() {
        let mut bindings = ActionBindings::new();
        bindings.bind(GRAB, ["/user/hand/left/input/a"]);
        bindings.bind(GRAB, ["/user/hand/left/input/a"]);
        assert_eq!(bindings.bound_paths(GRAB).len(), 2);
    }

    #[test]
    fn unbound_action_fails_with_no_binding() {
        let bindings = ActionBindings::new();
        assert_eq!(
            bindings.resolve_bound_path(GRAB, "/user/hand/left"),
            Err(NamingError::NoBinding {
                action: GRAB,
                sub_path: "/user/hand/left".to_string(),
            })
        );
    }

    #[test]
    fn prefix_must_match_from_the_start() {
        let mut bindings = ActionBindings::new();
        bindings.bind(GRAB, ["/user/hand/right/input/a"]);
        assert!(bindings.resolve_bound_path(GRAB, "/user/hand/left").is_err());
    }
}
