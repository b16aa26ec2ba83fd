//! Workspace actions module
//!
//! This module contains all workspace mutation methods organized by domain:
//! - `compose`: Cross-session workspace tree (graft, evict, focus parking)
//! - `directory`: Directory CRUD and ordering
//! - `layout`: Pane split, close and resize within a session
//! - `session`: Session CRUD, recently closed, ordering
//! - `terminal`: Input routing, screen projection and PTY sizing

mod compose;
mod directory;
mod layout;
mod session;
mod terminal;

pub use layout::LayoutTarget;
pub use terminal::PaneRect;

/// Move `items[from]` to position `to`, clamping `to` to the end.
pub(crate) fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    let target = to.min(items.len());
    items.insert(target, item);
    true
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::data::WorkspaceData;
    use crate::persistence::default_workspace;
    use crate::state::Workspace;
    use grove_terminal::FakeBackend;
    use std::sync::Arc;

    pub fn workspace() -> (Workspace, Arc<FakeBackend>) {
        workspace_from(default_workspace())
    }

    pub fn workspace_from(data: WorkspaceData) -> (Workspace, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new());
        (Workspace::new(data, backend.clone()), backend)
    }

    /// Workspace with one directory holding sessions named after `names`.
    /// Returns the session ids in order.
    pub fn workspace_with_sessions(names: &[&str]) -> (Workspace, Arc<FakeBackend>, String, Vec<String>) {
        let (mut ws, backend) = workspace();
        let dir = ws.add_directory("/home/me/project");
        let ids = names
            .iter()
            .filter_map(|name| ws.add_session(&dir, name, "/home/me/project").map(|c| c.id))
            .collect();
        backend.clear_calls();
        (ws, backend, dir, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_item_within_bounds() {
        let mut v = vec!['a', 'b', 'c', 'd'];
        assert!(move_item(&mut v, 0, 2));
        assert_eq!(v, vec!['b', 'c', 'a', 'd']);
        assert!(move_item(&mut v, 3, 0));
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn move_item_clamps_and_rejects() {
        let mut v = vec![1, 2, 3];
        assert!(move_item(&mut v, 0, 99));
        assert_eq!(v, vec![2, 3, 1]);
        assert!(!move_item(&mut v, 5, 0));
        assert!(!move_item(&mut v, 1, 1));
    }
}
