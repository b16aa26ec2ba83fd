use grove_git::VcsStatus;
use grove_layout::LayoutNode;
use serde::{Deserialize, Serialize};

/// One terminal session: a pane tree rooted in a working directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub id: String,
    pub name: String,
    pub cwd: String,
    /// Pane tree. Validation guarantees it is present after load.
    #[serde(default)]
    pub layout: Option<LayoutNode>,
    #[serde(default)]
    pub active_pane_id: String,
    /// Last polled repository status, never persisted
    #[serde(skip)]
    pub git_status: Option<VcsStatus>,
}

impl SessionData {
    /// Fresh session whose single pane shares the session id
    pub fn new(id: String, name: String, cwd: String) -> Self {
        Self {
            layout: Some(LayoutNode::pane(id.clone(), cwd.clone())),
            active_pane_id: id.clone(),
            id,
            name,
            cwd,
            git_status: None,
        }
    }

    pub fn pane_ids(&self) -> Vec<String> {
        self.layout.as_ref().map(|l| l.collect_leaf_ids()).unwrap_or_default()
    }

    pub fn pane_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.leaf_count())
    }
}

/// A directory grouping sessions in the sidebar
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectoryData {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default = "default_true")]
    pub expanded: bool,
    /// Ordered sessions in this directory
    #[serde(default)]
    pub sessions: Vec<SessionData>,
}

impl DirectoryData {
    pub fn session(&self, session_id: &str) -> Option<&SessionData> {
        self.sessions.iter().find(|s| s.id == session_id)
    }
}

/// Enough of a closed session to reopen it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosedSession {
    pub directory_id: String,
    pub name: String,
    pub cwd: String,
    /// Close time as seconds since the unix epoch
    #[serde(default)]
    pub closed_at: u64,
}

/// The main workspace data structure (serializable)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceData {
    /// Schema version for migration support
    #[serde(default = "default_workspace_version")]
    pub version: u32,
    #[serde(default)]
    pub directories: Vec<DirectoryData>,
    #[serde(default)]
    pub active_session_id: Option<String>,
    /// Sessions composed into one screen; leaves are session ids
    #[serde(default)]
    pub workspace_layout: Option<LayoutNode>,
    /// Workspace tree set aside while a non-member session is focused
    #[serde(default)]
    pub parked_layout: Option<LayoutNode>,
    /// Most recent first
    #[serde(default)]
    pub recently_closed: Vec<ClosedSession>,
}

fn default_workspace_version() -> u32 {
    0 // pre-versioning workspace files
}

fn default_true() -> bool {
    true
}

impl WorkspaceData {
    pub fn directory(&self, directory_id: &str) -> Option<&DirectoryData> {
        self.directories.iter().find(|d| d.id == directory_id)
    }

    pub fn directory_mut(&mut self, directory_id: &str) -> Option<&mut DirectoryData> {
        self.directories.iter_mut().find(|d| d.id == directory_id)
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionData> {
        self.directories.iter().find_map(|d| d.session(session_id))
    }

    pub fn session_mut(&mut self, session_id: &str) -> Option<&mut SessionData> {
        self.directories
            .iter_mut()
            .flat_map(|d| d.sessions.iter_mut())
            .find(|s| s.id == session_id)
    }

    /// Directory containing the given session
    pub fn directory_of(&self, session_id: &str) -> Option<&DirectoryData> {
        self.directories.iter().find(|d| d.session(session_id).is_some())
    }

    pub fn sessions(&self) -> impl Iterator<Item = &SessionData> {
        self.directories.iter().flat_map(|d| d.sessions.iter())
    }

    pub fn session_ids(&self) -> std::collections::HashSet<String> {
        self.sessions().map(|s| s.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_single_pane_with_session_id() {
        let session = SessionData::new("s1".into(), "api".into(), "/srv/api".into());
        assert_eq!(session.pane_ids(), vec!["s1"]);
        assert_eq!(session.active_pane_id, "s1");
        assert_eq!(session.layout, Some(LayoutNode::pane("s1", "/srv/api")));
    }

    #[test]
    fn git_status_is_not_serialized() {
        let mut session = SessionData::new("s1".into(), "api".into(), "/srv".into());
        session.git_status = Some(VcsStatus::default());
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("git_status").is_none());
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let data: WorkspaceData = serde_json::from_str(
            r#"{"directories":[{"id":"d1","name":"proj","path":"/p","sessions":[{"id":"s1","name":"main","cwd":"/p"}]}]}"#,
        )
        .unwrap();
        assert_eq!(data.version, 0);
        assert!(data.directories[0].expanded);
        assert!(data.session("s1").unwrap().layout.is_none());
        assert_eq!(data.directory_of("s1").map(|d| d.id.as_str()), Some("d1"));
        assert!(data.workspace_layout.is_none());
    }
}
