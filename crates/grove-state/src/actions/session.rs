//! Session actions
//!
//! Sessions are created inside a directory with a single pane. Removing a
//! session kills its panes and takes it out of both workspace slots.

use crate::actions::move_item;
use crate::data::{ClosedSession, SessionData};
use crate::state::{Created, Workspace};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

impl Workspace {
    /// Create a session in `directory_id` and make it active.
    ///
    /// The session's pane shares its id; the backend is asked to spawn it.
    /// `None` only when the directory is missing.
    pub fn add_session(&mut self, directory_id: &str, name: &str, cwd: &str) -> Option<Created> {
        let id = grove_core::id::new_id();
        self.insert_session(directory_id, SessionData::new(id, name.to_string(), cwd.to_string()))
    }

    fn insert_session(&mut self, directory_id: &str, session: SessionData) -> Option<Created> {
        let directory = self.data.directory_mut(directory_id)?;
        let id = session.id.clone();
        let cwd = session.cwd.clone();
        log::info!("Adding session {} ({}) to {}", session.name, grove_core::id::short(&id), directory.name);
        directory.sessions.push(session);

        let spawn = self.create_pane(&id, &cwd);
        self.select_active(&id);
        self.notify_data();
        Some(Created { id, spawn })
    }

    /// Remove a session, remembering it in the recently closed list
    pub fn remove_session(&mut self, directory_id: &str, session_id: &str) -> bool {
        let Some(directory) = self.data.directory_mut(directory_id) else {
            return false;
        };
        let Some(index) = directory.sessions.iter().position(|s| s.id == session_id) else {
            return false;
        };
        let closed = directory.sessions.remove(index);
        let fallback = directory.sessions.last().map(|s| s.id.clone());

        log::info!("Removing session {} ({})", closed.name, grove_core::id::short(session_id));
        let failures = self.kill_panes(closed.layout.as_ref());
        if failures > 0 {
            log::warn!("{} panes of session {} could not be killed", failures, session_id);
        }

        self.remember_closed(ClosedSession {
            directory_id: directory_id.to_string(),
            name: closed.name,
            cwd: closed.cwd,
            closed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        });

        if self.data.active_session_id.as_deref() == Some(session_id) {
            self.data.active_session_id = fallback;
        }
        self.prune_workspace_slots(&HashSet::from([session_id.to_string()]));
        self.notify_data();
        true
    }

    fn remember_closed(&mut self, closed: ClosedSession) {
        self.data.recently_closed.insert(0, closed);
        self.data.recently_closed.truncate(self.recently_closed_limit);
    }

    /// Reopen the closed session at `index` as a fresh session
    pub fn restore_session(&mut self, index: usize) -> Option<Created> {
        let item = self.data.recently_closed.get(index)?.clone();
        self.data.directory(&item.directory_id)?;
        self.data.recently_closed.remove(index);

        let id = grove_core::id::new_id();
        self.insert_session(&item.directory_id, SessionData::new(id, item.name, item.cwd))
    }

    /// Duplicate a session as "<name> (copy)" in the same working directory
    pub fn clone_session(&mut self, directory_id: &str, session_id: &str) -> Option<Created> {
        let source = self.data.directory(directory_id)?.session(session_id)?;
        let name = format!("{} (copy)", source.name);
        let cwd = source.cwd.clone();
        self.add_session(directory_id, &name, &cwd)
    }

    pub fn rename_session(&mut self, directory_id: &str, session_id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(session) = self
            .data
            .directory_mut(directory_id)
            .and_then(|d| d.sessions.iter_mut().find(|s| s.id == session_id))
        else {
            return false;
        };
        session.name = name.to_string();
        self.notify_data();
        true
    }

    pub fn reorder_sessions(&mut self, directory_id: &str, from: usize, to: usize) -> bool {
        let Some(directory) = self.data.directory_mut(directory_id) else {
            return false;
        };
        if !move_item(&mut directory.sessions, from, to) {
            return false;
        }
        self.notify_data();
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::actions::test_support::{workspace, workspace_with_sessions};
    use crate::persistence::default_workspace;
    use crate::settings::AppSettings;
    use crate::state::{Created, Workspace};
    use grove_layout::{DropZone, LayoutNode, SplitDirection};
    use grove_terminal::{BackendCall, BackendError, FakeBackend};
    use std::sync::Arc;

    #[test]
    fn add_session_spawns_its_pane_and_becomes_active() {
        let (mut ws, backend) = workspace();
        let dir = ws.add_directory("/srv/api");
        let created = ws.add_session(&dir, "api", "/srv/api").unwrap();
        assert!(created.is_spawned());
        let id = created.id;

        let session = ws.session(&id).unwrap();
        assert_eq!(session.layout, Some(LayoutNode::pane(id.clone(), "/srv/api")));
        assert_eq!(ws.data().active_session_id.as_deref(), Some(id.as_str()));
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Create {
                leaf_id: id,
                cwd: "/srv/api".to_string()
            }]
        );
    }

    #[test]
    fn add_session_to_missing_directory_is_none() {
        let (mut ws, backend) = workspace();
        assert!(ws.add_session("nope", "x", "/").is_none());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn add_session_reports_spawn_failure_and_keeps_session() {
        let (mut ws, backend) = workspace();
        let dir = ws.add_directory("/srv");
        backend.fail_creates(true);
        let created = ws.add_session(&dir, "s", "/srv").unwrap();
        assert!(matches!(created.spawn, Err(BackendError::Spawn { .. })));
        assert!(ws.session(&created.id).is_some());
        assert_eq!(ws.data().active_session_id.as_deref(), Some(created.id.as_str()));
    }

    #[test]
    fn remove_session_kills_all_panes_and_records_it() {
        let (mut ws, backend, dir, ids) = workspace_with_sessions(&["a", "b", "c"]);
        ws.split_pane(&ids[1], &ids[1], SplitDirection::Horizontal).unwrap();
        ws.select_active(&ids[1]);
        backend.clear_calls();

        assert!(ws.remove_session(&dir, &ids[1]));
        assert_eq!(backend.killed().len(), 2);
        assert_eq!(ws.data().recently_closed[0].name, "b");
        // the last remaining session of the directory takes over
        assert_eq!(ws.data().active_session_id.as_deref(), Some(ids[2].as_str()));
        assert!(!ws.remove_session(&dir, &ids[1]));
    }

    #[test]
    fn remove_session_prunes_live_and_parked_trees() {
        let (mut ws, _, dir, ids) = workspace_with_sessions(&["a", "b", "c"]);
        ws.graft(&ids[0], &ids[1], DropZone::Right);
        ws.graft(&ids[1], &ids[2], DropZone::Right);
        assert!(ws.remove_session(&dir, &ids[2]));
        assert_eq!(ws.workspace_layout().unwrap().collect_leaf_ids(), vec![ids[0].clone(), ids[1].clone()]);

        // park the tree by focusing a session outside it
        let d = ws.add_session(&dir, "d", "/x").unwrap().id;
        assert!(ws.workspace_layout().is_none());
        assert!(ws.parked_layout().is_some());
        assert_eq!(ws.data().active_session_id.as_deref(), Some(d.as_str()));

        assert!(ws.remove_session(&dir, &ids[0]));
        assert!(ws.parked_layout().is_none());
    }

    #[test]
    fn recently_closed_is_capped_by_settings() {
        let backend = Arc::new(FakeBackend::new());
        let settings = AppSettings {
            recently_closed_limit: 2,
            ..AppSettings::default()
        };
        let mut ws = Workspace::with_settings(default_workspace(), backend, &settings);
        let dir = ws.add_directory("/p");
        for name in ["a", "b", "c"] {
            let id = ws.add_session(&dir, name, "/p").unwrap().id;
            ws.remove_session(&dir, &id);
        }
        let names: Vec<&str> = ws.data().recently_closed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn restore_session_reopens_in_original_directory() {
        let (mut ws, backend, dir, ids) = workspace_with_sessions(&["a", "b"]);
        ws.remove_session(&dir, &ids[0]);
        backend.clear_calls();

        let restored = ws.restore_session(0).unwrap().id;
        let session = ws.session(&restored).unwrap();
        assert_eq!(session.name, "a");
        assert_eq!(ws.data().directory_of(&restored).unwrap().id, dir);
        assert!(ws.data().recently_closed.is_empty());
        assert_eq!(backend.created(), vec![restored.clone()]);
        assert_eq!(ws.data().active_session_id.as_deref(), Some(restored.as_str()));
        assert!(ws.restore_session(0).is_none());
    }

    #[test]
    fn restore_into_removed_directory_is_none() {
        let (mut ws, _, dir, ids) = workspace_with_sessions(&["a"]);
        let other = ws.add_directory("/other");
        ws.remove_session(&dir, &ids[0]);
        let mut data = ws.data().clone();
        data.directories.retain(|d| d.id == other);
        ws.replace_data(data);
        assert!(ws.restore_session(0).is_none());
        assert_eq!(ws.data().recently_closed.len(), 1);
    }

    #[test]
    fn clone_session_copies_name_and_cwd() {
        let (mut ws, _) = workspace();
        let dir = ws.add_directory("/p");
        let id = ws.add_session(&dir, "server", "/p/server").unwrap().id;
        let copy = ws.clone_session(&dir, &id).unwrap().id;
        let session = ws.session(&copy).unwrap();
        assert_eq!(session.name, "server (copy)");
        assert_eq!(session.cwd, "/p/server");
        assert_ne!(copy, id);
    }

    #[test]
    fn rename_and_reorder_sessions() {
        let (mut ws, _, dir, ids) = workspace_with_sessions(&["a", "b", "c"]);
        assert!(ws.rename_session(&dir, &ids[0], "  api  "));
        assert_eq!(ws.session(&ids[0]).unwrap().name, "api");
        assert!(!ws.rename_session(&dir, &ids[0], "   "));

        assert!(ws.reorder_sessions(&dir, 2, 0));
        let order: Vec<String> = ws.data().directory(&dir).unwrap().sessions.iter().map(|s| s.id.clone()).collect();
        assert_eq!(order, vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]);
        assert!(!ws.reorder_sessions("missing", 0, 1));
    }
}
