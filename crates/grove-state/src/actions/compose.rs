//! Workspace composition
//!
//! The workspace tree shows several sessions at once; its leaves are session
//! ids. Focusing a session outside the tree parks the tree in a side slot and
//! focusing a parked member brings it back unchanged.

use crate::state::Workspace;
use grove_layout::{DropZone, LayoutNode};
use std::collections::HashSet;

impl Workspace {
    fn in_workspace(&self, session_id: &str) -> bool {
        self.data
            .workspace_layout
            .as_ref()
            .is_some_and(|l| l.contains_leaf(session_id))
    }

    fn commit_workspace(&mut self, layout: LayoutNode, active: &str) {
        self.data.workspace_layout = Some(layout);
        self.data.active_session_id = Some(active.to_string());
        self.data.parked_layout = None;
        self.notify_data();
    }

    /// Drop `new_session_id` onto an edge of `target_session_id`.
    ///
    /// Without a workspace tree one is created from the two sessions. No-op
    /// when either session is unknown, they are the same, the new session is
    /// already composed, or the target is not part of an existing tree.
    pub fn graft(&mut self, target_session_id: &str, new_session_id: &str, zone: DropZone) -> bool {
        if target_session_id == new_session_id
            || self.data.session(target_session_id).is_none()
            || self.data.session(new_session_id).is_none()
            || self.in_workspace(new_session_id)
        {
            return false;
        }

        let new_leaf = LayoutNode::session(new_session_id);
        let layout = match &self.data.workspace_layout {
            None => LayoutNode::session(target_session_id).insert_at_target(
                target_session_id,
                new_leaf,
                zone.direction(),
                zone.inserts_before(),
            ),
            Some(layout) if layout.contains_leaf(target_session_id) => {
                layout.insert_at_target(target_session_id, new_leaf, zone.direction(), zone.inserts_before())
            }
            Some(_) => return false,
        };

        log::info!(
            "Composed session {} {:?} of {}",
            grove_core::id::short(new_session_id),
            zone,
            grove_core::id::short(target_session_id)
        );
        self.commit_workspace(layout, new_session_id);
        true
    }

    /// Drop `new_session_id` onto an edge of the whole screen.
    ///
    /// The existing workspace tree, or the active session when there is none,
    /// becomes one side of a new root split.
    pub fn graft_root(&mut self, new_session_id: &str, zone: DropZone) -> bool {
        if self.data.session(new_session_id).is_none() || self.in_workspace(new_session_id) {
            return false;
        }

        let existing = match &self.data.workspace_layout {
            Some(layout) => layout.clone(),
            None => match self.data.active_session_id.as_deref() {
                Some(active) if active != new_session_id && self.data.session(active).is_some() => {
                    LayoutNode::session(active)
                }
                _ => return false,
            },
        };

        let new_leaf = LayoutNode::session(new_session_id);
        let children = if zone.inserts_before() {
            vec![new_leaf, existing]
        } else {
            vec![existing, new_leaf]
        };
        let layout = LayoutNode::with_sizes(zone.direction(), grove_layout::mutation::SPLIT_SIZES.to_vec(), children);

        log::info!("Composed session {} at the {:?} edge", grove_core::id::short(new_session_id), zone);
        self.commit_workspace(layout, new_session_id);
        true
    }

    /// Take a session out of the workspace tree.
    ///
    /// When fewer than two sessions remain the tree is dropped and the
    /// survivor becomes the active session.
    pub fn evict(&mut self, session_id: &str) -> bool {
        let Some(layout) = self.data.workspace_layout.as_ref() else {
            return false;
        };
        if !layout.contains_leaf(session_id) {
            return false;
        }

        match layout.remove(session_id) {
            Some(remaining) if !remaining.is_leaf() => {
                self.data.workspace_layout = Some(remaining);
                if self.data.active_session_id.as_deref() == Some(session_id) {
                    let first = self.data.workspace_layout.as_ref().map(|l| l.first_leaf_id().to_string());
                    self.data.active_session_id = first;
                }
            }
            remaining => {
                if let Some(survivor) = remaining.as_ref().and_then(|l| l.leaf_id()) {
                    self.data.active_session_id = Some(survivor.to_string());
                }
                self.data.workspace_layout = None;
                log::info!("Workspace dissolved");
            }
        }
        self.notify_data();
        true
    }

    /// Focus a session, parking or restoring the workspace tree as needed
    pub fn select_active(&mut self, session_id: &str) -> bool {
        if self.data.session(session_id).is_none() {
            return false;
        }

        if self.data.workspace_layout.is_some() {
            if !self.in_workspace(session_id) {
                log::debug!("Parking workspace while {} is focused", grove_core::id::short(session_id));
                self.data.parked_layout = self.data.workspace_layout.take();
            }
        } else if let Some(parked) = self.data.parked_layout.take() {
            if parked.contains_leaf(session_id) {
                log::debug!("Restoring parked workspace");
                self.data.workspace_layout = Some(parked);
            } else {
                log::debug!("Discarding parked workspace");
            }
        }

        self.data.active_session_id = Some(session_id.to_string());
        self.notify_data();
        true
    }

    /// Route a sidebar drag: onto a session edge grafts there, onto empty
    /// screen space grafts at the root.
    pub fn drop_session(&mut self, dragged_session_id: &str, target_session_id: Option<&str>, zone: DropZone) -> bool {
        match target_session_id {
            Some(target) => self.graft(target, dragged_session_id, zone),
            None => self.graft_root(dragged_session_id, zone),
        }
    }

    /// Remove sessions from both workspace slots; a slot left with one leaf is cleared.
    pub(crate) fn prune_workspace_slots(&mut self, removed: &HashSet<String>) {
        let prune = |slot: &Option<LayoutNode>| -> Option<LayoutNode> {
            let pruned = slot.as_ref()?.retain_leaves(&mut |id, _| !removed.contains(id))?;
            (!pruned.is_leaf()).then_some(pruned)
        };
        self.data.workspace_layout = prune(&self.data.workspace_layout);
        self.data.parked_layout = prune(&self.data.parked_layout);
    }
}
