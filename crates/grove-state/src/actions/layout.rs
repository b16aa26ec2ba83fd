//! Layout manipulation workspace actions
//!
//! Actions for splitting, closing and resizing panes within a session, and
//! for resizing the workspace tree.

use crate::state::{Created, Workspace};
use grove_layout::{LayoutNode, LeafPayload, SizeUpdate, SplitDirection};
use grove_terminal::BackendError;

/// Which tree a size update targets
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutTarget {
    Session(String),
    Workspace,
}

impl Workspace {
    /// Split a pane; the new pane opens in the same cwd and becomes active.
    ///
    /// The split is kept even if the backend fails to spawn the new pane.
    pub fn split_pane(&mut self, session_id: &str, pane_id: &str, direction: SplitDirection) -> Option<Created> {
        let session = self.data.session_mut(session_id)?;
        let layout = session.layout.as_ref()?;
        let (new_layout, new_pane_id) = layout.split(pane_id, direction);
        let new_pane_id = new_pane_id?;

        let cwd = match new_layout.leaf(&new_pane_id) {
            Some(LeafPayload::Pane { cwd }) => cwd.clone(),
            _ => session.cwd.clone(),
        };
        session.layout = Some(new_layout);
        session.active_pane_id = new_pane_id.clone();
        log::info!(
            "Split pane {} of session {} ({})",
            grove_core::id::short(pane_id),
            grove_core::id::short(session_id),
            direction.display_name()
        );

        let spawn = self.create_pane(&new_pane_id, &cwd);
        self.notify_data();
        Some(Created { id: new_pane_id, spawn })
    }

    /// Close a pane and return the backend's kill result. The last pane of a
    /// session cannot be closed.
    ///
    /// `None` means nothing was closed; a kill error still leaves the pane
    /// removed from the tree.
    pub fn close_pane(&mut self, session_id: &str, pane_id: &str) -> Option<Result<(), BackendError>> {
        let session = self.data.session_mut(session_id)?;
        let layout = session.layout.as_ref()?;
        if !layout.contains_leaf(pane_id) || layout.leaf_count() <= 1 {
            return None;
        }
        let new_layout = layout.remove(pane_id)?;

        if session.active_pane_id == pane_id {
            session.active_pane_id = new_layout.first_leaf_id().to_string();
        }
        session.layout = Some(new_layout);
        log::info!("Closed pane {} of session {}", grove_core::id::short(pane_id), grove_core::id::short(session_id));

        let killed = self.kill_pane(pane_id);
        self.notify_data();
        Some(killed)
    }

    /// Focus a pane inside its session. Unknown panes are ignored.
    pub fn set_active_pane(&mut self, session_id: &str, pane_id: &str) -> bool {
        let Some(session) = self.data.session_mut(session_id) else {
            return false;
        };
        if !session.layout.as_ref().is_some_and(|l| l.contains_leaf(pane_id)) {
            return false;
        }
        session.active_pane_id = pane_id.to_string();
        true
    }

    /// Update split sizes at a path.
    ///
    /// Stale paths are ignored. So are sizes that would leave the split
    /// malformed or with a child below the minimum size.
    pub fn update_sizes(&mut self, target: &LayoutTarget, path: &[usize], sizes: Vec<f32>) -> bool {
        let Some(slot) = self.layout_slot(target) else {
            return false;
        };
        let Some(updated) = slot.as_ref().and_then(|layout| layout.with_sizes_at_path(path, sizes)) else {
            log::debug!("Ignoring size update at {:?}: stale path or invalid sizes", path);
            return false;
        };
        *slot = Some(updated);
        self.notify_data();
        true
    }

    /// Write back one sample of an interactive divider drag
    pub fn apply_size_update(&mut self, target: &LayoutTarget, update: &SizeUpdate) -> bool {
        self.update_sizes(target, &update.path, update.sizes.clone())
    }

    pub fn layout(&self, target: &LayoutTarget) -> Option<&LayoutNode> {
        match target {
            LayoutTarget::Session(id) => self.data.session(id)?.layout.as_ref(),
            LayoutTarget::Workspace => self.data.workspace_layout.as_ref(),
        }
    }

    fn layout_slot(&mut self, target: &LayoutTarget) -> Option<&mut Option<LayoutNode>> {
        match target {
            LayoutTarget::Session(id) => Some(&mut self.data.session_mut(id)?.layout),
            LayoutTarget::Workspace => Some(&mut self.data.workspace_layout),
        }
    }
}
