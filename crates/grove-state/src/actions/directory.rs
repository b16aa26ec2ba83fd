//! Directory actions
//!
//! Directories group sessions by project root.

use crate::actions::move_item;
use crate::data::DirectoryData;
use crate::state::Workspace;
use std::collections::HashSet;
use std::path::Path;

impl Workspace {
    /// Add a directory; its name is the last path component
    pub fn add_directory(&mut self, path: &str) -> String {
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();
        let id = grove_core::id::new_id();
        log::info!("Adding directory {} ({})", name, path);
        self.data.directories.push(DirectoryData {
            id: id.clone(),
            name,
            path: path.to_string(),
            expanded: true,
            sessions: Vec::new(),
        });
        self.notify_data();
        id
    }

    /// Remove a directory with all its sessions, killing every pane they own
    pub fn remove_directory(&mut self, directory_id: &str) -> bool {
        let Some(index) = self.data.directories.iter().position(|d| d.id == directory_id) else {
            return false;
        };
        let directory = self.data.directories.remove(index);
        log::info!("Removing directory {} with {} sessions", directory.name, directory.sessions.len());

        for session in &directory.sessions {
            self.kill_panes(session.layout.as_ref());
        }

        let removed: HashSet<String> = directory.sessions.iter().map(|s| s.id.clone()).collect();
        self.prune_workspace_slots(&removed);
        if self.data.active_session_id.as_ref().is_some_and(|id| removed.contains(id)) {
            self.data.active_session_id = None;
        }
        self.data.recently_closed.retain(|c| c.directory_id != directory_id);
        self.notify_data();
        true
    }

    /// Flip a directory's expanded flag
    pub fn toggle_directory(&mut self, directory_id: &str) -> bool {
        let Some(directory) = self.data.directory_mut(directory_id) else {
            return false;
        };
        directory.expanded = !directory.expanded;
        self.notify_data();
        true
    }

    pub fn reorder_directories(&mut self, from: usize, to: usize) -> bool {
        if !move_item(&mut self.data.directories, from, to) {
            return false;
        }
        self.notify_data();
        true
    }
}
