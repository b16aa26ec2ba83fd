use crate::data::{SessionData, WorkspaceData};
use crate::settings::AppSettings;
use grove_layout::{LayoutNode, LeafPayload};
use grove_terminal::{BackendError, ProcessBackend};
use std::sync::Arc;

/// A leaf added by an action and the backend's answer to spawning its process.
///
/// The tree change stands even when `spawn` is an error.
#[derive(Debug)]
pub struct Created {
    pub id: String,
    pub spawn: Result<(), BackendError>,
}

impl Created {
    pub fn is_spawned(&self) -> bool {
        self.spawn.is_ok()
    }
}

/// Owns workspace data and the process backend; every structural edit goes
/// through `&mut self`.
pub struct Workspace {
    pub(crate) data: WorkspaceData,
    pub(crate) backend: Arc<dyn ProcessBackend>,
    /// Monotonic counter incremented only on persistent data mutations.
    /// The auto-save loop compares this to skip saves for transient changes.
    data_version: u64,
    /// Forward input to every visible session. Not serialized.
    pub(crate) broadcast: bool,
    pub(crate) recently_closed_limit: usize,
}

impl Workspace {
    pub fn new(data: WorkspaceData, backend: Arc<dyn ProcessBackend>) -> Self {
        Self::with_settings(data, backend, &AppSettings::default())
    }

    pub fn with_settings(data: WorkspaceData, backend: Arc<dyn ProcessBackend>, settings: &AppSettings) -> Self {
        Self {
            data,
            backend,
            data_version: 0,
            broadcast: false,
            recently_closed_limit: settings.recently_closed_limit,
        }
    }

    /// Current data version (incremented on persistent data mutations)
    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    /// Read-only access to persistent workspace data.
    pub fn data(&self) -> &WorkspaceData {
        &self.data
    }

    /// Bump the data version after mutating `self.data`.
    pub fn notify_data(&mut self) {
        self.data_version += 1;
    }

    /// Replace workspace data wholesale (e.g. from disk reload).
    /// Does NOT bump data_version: the data came from disk, not a user edit.
    pub fn replace_data(&mut self, data: WorkspaceData) {
        self.data = data;
    }

    pub fn backend(&self) -> &Arc<dyn ProcessBackend> {
        &self.backend
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionData> {
        self.data.session(session_id)
    }

    pub fn active_session(&self) -> Option<&SessionData> {
        self.data.active_session_id.as_deref().and_then(|id| self.data.session(id))
    }

    pub fn workspace_layout(&self) -> Option<&LayoutNode> {
        self.data.workspace_layout.as_ref()
    }

    pub fn parked_layout(&self) -> Option<&LayoutNode> {
        self.data.parked_layout.as_ref()
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcast
    }

    /// Request a kill for every leaf of a pane tree. Returns the number of failures.
    pub(crate) fn kill_panes(&self, layout: Option<&LayoutNode>) -> usize {
        let Some(layout) = layout else {
            return 0;
        };
        layout
            .collect_leaf_ids()
            .iter()
            .filter(|id| self.kill_pane(id).is_err())
            .count()
    }

    pub(crate) fn kill_pane(&self, pane_id: &str) -> Result<(), BackendError> {
        self.backend.kill(pane_id).inspect_err(|e| {
            log::warn!("Failed to kill pane {}: {}", pane_id, e);
        })
    }

    pub(crate) fn create_pane(&self, pane_id: &str, cwd: &str) -> Result<(), BackendError> {
        self.backend.create(pane_id, cwd).inspect_err(|e| {
            log::warn!("Failed to create pane {}: {}", pane_id, e);
        })
    }

    /// Request a process for every pane of every session currently on screen.
    /// Returns the number of panes that failed to spawn.
    pub fn spawn_visible_panes(&self) -> usize {
        let mut failures = 0;
        for session_id in self.visible_sessions() {
            let Some(session) = self.data.session(&session_id) else {
                continue;
            };
            let Some(layout) = &session.layout else {
                continue;
            };
            for pane_id in layout.collect_leaf_ids() {
                let cwd = match layout.leaf(&pane_id) {
                    Some(LeafPayload::Pane { cwd }) => cwd.as_str(),
                    _ => session.cwd.as_str(),
                };
                if self.create_pane(&pane_id, cwd).is_err() {
                    failures += 1;
                }
            }
        }
        failures
    }
}
