//! Session controller: one record or replay run, start to teardown.
//!
//! The mode is fixed when the session opens. Every per-call operation
//! dispatches on it:
//!   RECORD  live values pass through, sampled ones are appended
//!   REPLAY  recorded values replace live ones when the trace has them
//!
//! The session owns every table (paths, bindings, frame names, cursor
//! index). Closing or dropping it discards them; a new session starts
//! empty. Only `open` can fail hard; per-call operations degrade to the
//! unknown sentinel or to the live value and log a warning.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use rnr_trace::bindings::ActionBindings;
use rnr_trace::domain::{
    ActionBoolean, ActionFloat, ActionHandle, ActionVector2, FrameHandle, PathHandle, Pose, View,
    XrTime, UNKNOWN_NAME,
};
use rnr_trace::frames::{FrameNames, ReferenceSpaceKind};
use rnr_trace::paths::PathRegistry;

use crate::config::{ConfigError, Mode, SessionConfig};
use crate::cursor::TraceCursor;
use crate::recorder::Recorder;
use crate::trace_store::StoreError;

/// Views per set when the live runtime supplied none to size from.
const STEREO_VIEW_COUNT: usize = 2;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

enum Backend {
    Record(Recorder),
    Replay(TraceCursor),
}

pub struct Session {
    mode: Mode,
    trace_path: PathBuf,
    paths: PathRegistry,
    bindings: ActionBindings,
    frames: FrameNames,
    backend: Backend,
}

impl Session {
    /// Open the trace for the configured mode.
    ///
    /// RECORD creates the trace's parent directory and truncates the file;
    /// REPLAY opens it read-only.
    pub fn open(config: &SessionConfig) -> Result<Self, SessionError> {
        let backend = match config.mode {
            Mode::Record => Backend::Record(Recorder::create(&config.trace_path)?),
            Mode::Replay => Backend::Replay(TraceCursor::open(&config.trace_path)?),
        };
        info!(
            mode = %config.mode,
            file = %config.trace_path.display(),
            "rnr session opened"
        );
        Ok(Self::with_backend(config, backend))
    }

    /// Open from `<local data dir>/librnr/config.txt`.
    pub fn from_default_config() -> Result<Self, SessionError> {
        let config = SessionConfig::load_default()?;
        Self::open(&config)
    }

    fn with_backend(config: &SessionConfig, backend: Backend) -> Self {
        Self {
            mode: config.mode,
            trace_path: config.trace_path.clone(),
            paths: PathRegistry::new(),
            bindings: ActionBindings::new(),
            frames: FrameNames::new(),
            backend,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn trace_path(&self) -> &Path {
        &self.trace_path
    }

    pub fn paths(&self) -> &PathRegistry {
        &self.paths
    }

    pub fn bindings(&self) -> &ActionBindings {
        &self.bindings
    }

    pub fn frames(&self) -> &FrameNames {
        &self.frames
    }

    // ── Naming ─────────────────────────────────────────────────────

    /// The runtime converted `path` to `handle`.
    pub fn string_to_path(&mut self, path: &str, handle: PathHandle) {
        debug!(path, handle = %handle, "string to path");
        self.paths.observe(path, handle);
    }

    pub fn intern_path(&mut self, path: &str) -> PathHandle {
        self.paths.intern(path)
    }

    pub fn path_name(&self, handle: PathHandle) -> &str {
        self.paths.name_of(handle)
    }

    pub fn create_action_set(&self, name: &str) {
        info!(name, "action set created");
    }

    pub fn create_action(&self, action: ActionHandle, name: &str) {
        info!(action = %action, name, "action created");
    }

    /// Bind the suggested physical paths to `action`, in suggestion order.
    pub fn suggest_bindings(&mut self, action: ActionHandle, bindings: &[PathHandle]) {
        let paths: Vec<String> = bindings
            .iter()
            .map(|handle| self.paths.name_of(*handle).to_string())
            .collect();
        debug!(action = %action, ?paths, "bindings suggested");
        self.bindings.bind(action, paths);
    }

    /// Name a reference frame and settle its pose in the reference.
    ///
    /// RECORD traces the creation and returns `pose_in_reference`. REPLAY
    /// returns the recorded pose for that kind of frame when the trace has
    /// one, `pose_in_reference` otherwise.
    pub fn create_reference_space(
        &mut self,
        frame: FrameHandle,
        raw_kind: i32,
        pose_in_reference: Pose,
        time: XrTime,
    ) -> Pose {
        let kind = ReferenceSpaceKind::from_raw(raw_kind);
        let name = self.frames.name_reference_frame(frame, kind).to_string();
        info!(frame = %frame, kind = %name, "reference space created");

        match &mut self.backend {
            Backend::Record(recorder) => {
                recorder.record_reference_space(time, &name, pose_in_reference);
                pose_in_reference
            }
            Backend::Replay(cursor) => match cursor.latest_reference_space(&name, time) {
                Some(recorded) => recorded.pose,
                None => {
                    debug!(kind = %name, time, "no recorded reference space");
                    pose_in_reference
                }
            },
        }
    }

    /// Name an action frame after its bound path. An unresolved frame
    /// stays unnamed and is traced under the unknown sentinel.
    pub fn create_action_space(
        &mut self,
        frame: FrameHandle,
        action: ActionHandle,
        sub_path: PathHandle,
    ) {
        let sub_path = self.sub_path_prefix(sub_path);
        if let Ok(name) = self
            .frames
            .name_action_frame(frame, action, &sub_path, &self.bindings)
        {
            info!(frame = %frame, action = %action, name, "action space created");
        }
    }

    /// Prefix string for a sub-action path; the null path matches every
    /// binding.
    fn sub_path_prefix(&self, sub_path: PathHandle) -> String {
        if sub_path == PathHandle(0) {
            return String::new();
        }
        self.paths.name_of(sub_path).to_string()
    }

    /// Trace key of an action state: the bound path matching `sub_path`.
    fn action_key(&self, action: ActionHandle, sub_path: PathHandle) -> String {
        let prefix = self.sub_path_prefix(sub_path);
        match self.bindings.resolve_bound_path(action, &prefix) {
            Ok(path) => path.to_string(),
            Err(err) => {
                warn!(error = %err, "action state untracked");
                UNKNOWN_NAME.to_string()
            }
        }
    }

    // ── Spatial queries ────────────────────────────────────────────

    /// Location of `frame` in `base` at `time`. `live` is the runtime's
    /// answer, `None` if its query failed.
    ///
    /// RECORD returns `live` unchanged; REPLAY returns the recorded pose
    /// when the trace has one, `live` otherwise.
    pub fn locate_space(
        &mut self,
        frame: FrameHandle,
        base: FrameHandle,
        time: XrTime,
        live: Option<Pose>,
    ) -> Option<Pose> {
        let space = self.frames.name_of(frame).to_string();
        let base_space = self.frames.name_of(base).to_string();

        match &mut self.backend {
            Backend::Record(recorder) => {
                if let Some(pose) = live {
                    recorder.record_location(time, &space, &base_space, pose);
                }
                live
            }
            Backend::Replay(cursor) => {
                match cursor.latest_location(&space, &base_space, time) {
                    Some(location) => Some(location.pose),
                    None => {
                        debug!(space = %space, base = %base_space, time, "no recorded location");
                        live
                    }
                }
            }
        }
    }

    /// Views located in `frame` at `time`.
    ///
    /// REPLAY needs every eye of the set to be recorded; otherwise the
    /// live views are returned. The set size follows `live` when given,
    /// stereo otherwise.
    pub fn locate_views(
        &mut self,
        frame: FrameHandle,
        view_configuration: u32,
        time: XrTime,
        live: Option<&[View]>,
    ) -> Option<Vec<View>> {
        let space = self.frames.name_of(frame).to_string();

        match &mut self.backend {
            Backend::Record(recorder) => {
                if let Some(views) = live {
                    recorder.record_views(time, &space, view_configuration, views);
                }
                live.map(<[View]>::to_vec)
            }
            Backend::Replay(cursor) => {
                let count = live.map_or(STEREO_VIEW_COUNT, <[View]>::len);
                let mut views = Vec::with_capacity(count);
                for index in 0..count as u32 {
                    match cursor.latest_view(&space, index, time) {
                        Some(view) => views.push(view.clone()),
                        None => {
                            debug!(space = %space, index, time, "no recorded view");
                            return live.map(<[View]>::to_vec);
                        }
                    }
                }
                Some(views)
            }
        }
    }

    // ── Action states ──────────────────────────────────────────────

    pub fn action_state_float(
        &mut self,
        action: ActionHandle,
        sub_path: PathHandle,
        time: XrTime,
        live: Option<ActionFloat>,
    ) -> Option<ActionFloat> {
        let key = self.action_key(action, sub_path);
        match &mut self.backend {
            Backend::Record(recorder) => {
                if let Some(state) = live {
                    recorder.record_float(time, &key, state);
                }
                live
            }
            Backend::Replay(cursor) => cursor.latest_float(&key, time).copied().or(live),
        }
    }

    pub fn action_state_vector2(
        &mut self,
        action: ActionHandle,
        sub_path: PathHandle,
        time: XrTime,
        live: Option<ActionVector2>,
    ) -> Option<ActionVector2> {
        let key = self.action_key(action, sub_path);
        match &mut self.backend {
            Backend::Record(recorder) => {
                if let Some(state) = live {
                    recorder.record_vector2(time, &key, state);
                }
                live
            }
            Backend::Replay(cursor) => cursor.latest_vector2(&key, time).copied().or(live),
        }
    }

    pub fn action_state_boolean(
        &mut self,
        action: ActionHandle,
        sub_path: PathHandle,
        time: XrTime,
        live: Option<ActionBoolean>,
    ) -> Option<ActionBoolean> {
        let key = self.action_key(action, sub_path);
        match &mut self.backend {
            Backend::Record(recorder) => {
                if let Some(state) = live {
                    recorder.record_boolean(time, &key, state);
                }
                live
            }
            Backend::Replay(cursor) => cursor.latest_boolean(&key, time).copied().or(live),
        }
    }

    // ── Haptics ────────────────────────────────────────────────────

    pub fn apply_haptic(&mut self, action: ActionHandle, sub_path: PathHandle, time: XrTime) {
        self.record_haptic(action, sub_path, time, true);
    }

    pub fn stop_haptic(&mut self, action: ActionHandle, sub_path: PathHandle, time: XrTime) {
        self.record_haptic(action, sub_path, time, false);
    }

    fn record_haptic(
        &mut self,
        action: ActionHandle,
        sub_path: PathHandle,
        time: XrTime,
        fired: bool,
    ) {
        let key = self.action_key(action, sub_path);
        match &mut self.backend {
            Backend::Record(recorder) => {
                recorder.record_haptic(time, &key, fired);
            }
            Backend::Replay(_) => debug!(key = %key, fired, "haptic passed through during replay"),
        }
    }

    /// REPLAY: whether the recorded haptic output was firing at `time`.
    pub fn haptic_state(
        &mut self,
        action: ActionHandle,
        sub_path: PathHandle,
        time: XrTime,
    ) -> Option<bool> {
        let key = self.action_key(action, sub_path);
        match &mut self.backend {
            Backend::Record(_) => None,
            Backend::Replay(cursor) => cursor.latest_haptic(&key, time).map(|h| h.fired),
        }
    }

    // ── Teardown ───────────────────────────────────────────────────

    /// Flush and release the trace. All naming state is discarded.
    pub fn close(self) -> Result<(), SessionError> {
        match self.backend {
            Backend::Record(recorder) => {
                info!(
                    entries = recorder.entries_written(),
                    dropped = recorder.dropped(),
                    "rnr session closed"
                );
                recorder.close()?;
            }
            Backend::Replay(cursor) => {
                info!(
                    lines = cursor.lines_read(),
                    skipped = cursor.lines_skipped(),
                    exhausted = cursor.is_exhausted(),
                    "rnr session closed"
                );
            }
        }
        Ok(())
    }
}
