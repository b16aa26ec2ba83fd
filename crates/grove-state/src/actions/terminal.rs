//! Terminal-facing workspace actions
//!
//! Input routing, projecting visible panes onto the screen, and keeping PTY
//! grid sizes and git status in step with the layout.

use crate::state::Workspace;
use grove_git::{VcsStatus, VersionControlQuery};
use grove_layout::{Rect, project};
use serde::Serialize;
use std::path::Path;

/// One visible pane in normalized screen coordinates with its grid size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaneRect {
    pub session_id: String,
    pub pane_id: String,
    pub rect: Rect,
    pub cols: u16,
    pub rows: u16,
}

impl Workspace {
    /// Sessions currently on screen: the workspace tree in leaf order, or the
    /// active session alone.
    pub fn visible_sessions(&self) -> Vec<String> {
        if let Some(layout) = &self.data.workspace_layout {
            return layout.collect_leaf_ids();
        }
        self.active_session().map(|s| vec![s.id.clone()]).unwrap_or_default()
    }

    /// Toggle input broadcast. Returns the new state.
    pub fn toggle_broadcast(&mut self) -> bool {
        self.broadcast = !self.broadcast;
        log::info!("Input broadcast {}", if self.broadcast { "on" } else { "off" });
        self.broadcast
    }

    /// Route keyboard input. Returns the number of panes written to.
    ///
    /// With broadcast on every visible session's active pane receives the
    /// bytes, otherwise only the active pane of the active session.
    pub fn send_input(&self, data: &[u8]) -> usize {
        let targets: Vec<String> = if self.broadcast {
            self.visible_sessions()
                .iter()
                .filter_map(|id| self.data.session(id))
                .map(|s| s.active_pane_id.clone())
                .collect()
        } else {
            self.active_session().map(|s| vec![s.active_pane_id.clone()]).unwrap_or_default()
        };

        for pane_id in &targets {
            self.backend.write(pane_id, data);
        }
        targets.len()
    }

    /// Rectangles of every visible pane on a `cols` x `rows` screen
    pub fn layout_rects(&self, cols: u16, rows: u16) -> Vec<PaneRect> {
        let session_rects: Vec<(String, Rect)> = match &self.data.workspace_layout {
            Some(layout) => project(layout, Rect::UNIT)
                .leaves
                .into_iter()
                .map(|leaf| (leaf.id, leaf.rect))
                .collect(),
            None => self
                .active_session()
                .map(|s| vec![(s.id.clone(), Rect::UNIT)])
                .unwrap_or_default(),
        };

        let mut rects = Vec::new();
        for (session_id, bounds) in session_rects {
            let Some(layout) = self.data.session(&session_id).and_then(|s| s.layout.as_ref()) else {
                continue;
            };
            for leaf in project(layout, bounds).leaves {
                let (c, r) = leaf.rect.to_cells(cols, rows);
                rects.push(PaneRect {
                    session_id: session_id.clone(),
                    pane_id: leaf.id,
                    rect: leaf.rect,
                    cols: c,
                    rows: r,
                });
            }
        }
        rects
    }

    /// Push the grid size of every visible pane to the backend
    pub fn sync_pty_sizes(&self, cols: u16, rows: u16) -> usize {
        let rects = self.layout_rects(cols, rows);
        for pane in &rects {
            self.backend.resize(&pane.pane_id, pane.cols, pane.rows);
        }
        rects.len()
    }

    /// Store a status sample. Not persisted, so the data version is untouched.
    pub fn update_git_status(&mut self, session_id: &str, status: Option<VcsStatus>) -> bool {
        let Some(session) = self.data.session_mut(session_id) else {
            return false;
        };
        if session.git_status == status {
            return false;
        }
        session.git_status = status;
        true
    }

    /// Session id and cwd of every session, for querying status elsewhere
    pub fn git_targets(&self) -> Vec<(String, String)> {
        self.data.sessions().map(|s| (s.id.clone(), s.cwd.clone())).collect()
    }

    /// Store statuses sampled for [`Workspace::git_targets`]. Sessions removed
    /// since are skipped. Returns how many changed.
    pub fn apply_git_statuses(&mut self, samples: Vec<(String, Option<VcsStatus>)>) -> usize {
        samples
            .into_iter()
            .filter(|(id, status)| self.update_git_status(id, status.clone()))
            .count()
    }

    /// Query status for every session's cwd. Returns how many changed.
    pub fn refresh_git_status(&mut self, vcs: &dyn VersionControlQuery) -> usize {
        let samples = self
            .git_targets()
            .into_iter()
            .map(|(id, cwd)| {
                let status = vcs.status(Path::new(&cwd));
                (id, status)
            })
            .collect();
        self.apply_git_statuses(samples)
    }
}
