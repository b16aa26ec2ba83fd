use crate::data::WorkspaceData;
use anyhow::{Context, Result};
use grove_layout::{LayoutNode, LeafPayload, validate};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Current workspace schema version - increment when making breaking changes
pub const WORKSPACE_VERSION: u32 = 1;

/// Get the config directory path
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("grove")
}

/// Get the workspace file path
pub fn get_workspace_path() -> PathBuf {
    get_config_dir().join("workspace.json")
}

/// Validate and fix workspace data consistency.
/// Called after deserialization in all load paths.
pub fn validate_workspace_data(data: &mut WorkspaceData) {
    // Session ids must be unique across directories
    let mut session_ids = HashSet::new();
    for directory in &mut data.directories {
        directory.sessions.retain(|s| {
            let fresh = session_ids.insert(s.id.clone());
            if !fresh {
                log::warn!("Dropping duplicate session {}", s.id);
            }
            fresh
        });
    }

    // Pane ids key processes, so they must be unique across all sessions too
    let mut claimed: HashSet<String> = HashSet::new();
    for session in data.directories.iter_mut().flat_map(|d| d.sessions.iter_mut()) {
        let live: HashSet<String> = session
            .layout
            .as_ref()
            .map(|layout| pane_leaf_ids(layout).into_iter().filter(|id| !claimed.contains(id)).collect())
            .unwrap_or_default();

        session.layout = validate(session.layout.as_ref(), &live);
        if session.layout.is_none() {
            let pane_id = if claimed.contains(&session.id) {
                grove_core::id::new_id()
            } else {
                session.id.clone()
            };
            log::warn!("Session {} had no panes, recreating a single pane", session.id);
            session.layout = Some(LayoutNode::pane(pane_id, session.cwd.clone()));
        }

        let layout_ids = session.pane_ids();
        if !layout_ids.contains(&session.active_pane_id) {
            session.active_pane_id = layout_ids.first().cloned().unwrap_or_default();
        }
        claimed.extend(layout_ids);
    }

    data.workspace_layout = validate_workspace_slot(data.workspace_layout.take(), &session_ids);
    data.parked_layout = validate_workspace_slot(data.parked_layout.take(), &session_ids);

    if let Some(active) = &data.active_session_id {
        if !session_ids.contains(active) {
            log::warn!("Active session {} no longer exists", active);
            data.active_session_id = None;
        }
    }

    let directory_ids: HashSet<String> = data.directories.iter().map(|d| d.id.clone()).collect();
    data.recently_closed.retain(|c| directory_ids.contains(&c.directory_id));
}

fn pane_leaf_ids(layout: &LayoutNode) -> Vec<String> {
    layout
        .collect_leaf_ids()
        .into_iter()
        .filter(|id| matches!(layout.leaf(id), Some(LeafPayload::Pane { .. })))
        .collect()
}

/// A workspace tree is only meaningful with at least two sessions.
fn validate_workspace_slot(layout: Option<LayoutNode>, session_ids: &HashSet<String>) -> Option<LayoutNode> {
    match validate(layout.as_ref(), session_ids) {
        Some(node) if node.is_leaf() => None,
        other => other,
    }
}

/// Load workspace from the default location
pub fn load_workspace() -> Result<WorkspaceData> {
    load_workspace_from(&get_workspace_path())
}

/// Save workspace to the default location
pub fn save_workspace(data: &WorkspaceData) -> Result<()> {
    save_workspace_to(&get_workspace_path(), data)
}

/// Load workspace from disk; a missing file yields an empty workspace
pub fn load_workspace_from(path: &Path) -> Result<WorkspaceData> {
    if !path.exists() {
        log::info!("Workspace file not found at {}, starting empty", path.display());
        return Ok(default_workspace());
    }

    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let data: WorkspaceData =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut data = migrate_workspace(data);
    validate_workspace_data(&mut data);
    Ok(data)
}

/// Save workspace to disk
pub fn save_workspace_to(path: &Path, data: &WorkspaceData) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(data)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Migrate workspace data from older versions to the current version
pub fn migrate_workspace(mut data: WorkspaceData) -> WorkspaceData {
    let original_version = data.version;

    // Migration from version 0 (pre-versioning) to version 1
    if data.version == 0 {
        log::info!("Migrating workspace from pre-versioning (v0) to v1");
        data.version = 1;
    }

    if original_version != data.version {
        log::info!("Workspace migrated from v{} to v{}", original_version, data.version);
    }

    data
}

/// Empty workspace with no directories
pub fn default_workspace() -> WorkspaceData {
    WorkspaceData {
        version: WORKSPACE_VERSION,
        directories: Vec::new(),
        active_session_id: None,
        workspace_layout: None,
        parked_layout: None,
        recently_closed: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClosedSession, DirectoryData, SessionData};
    use grove_layout::SplitDirection;

    fn session(id: &str, layout: Option<LayoutNode>, active_pane: &str) -> SessionData {
        SessionData {
            id: id.to_string(),
            name: id.to_string(),
            cwd: "/p".to_string(),
            layout,
            active_pane_id: active_pane.to_string(),
            git_status: None,
        }
    }

    fn workspace_with(sessions: Vec<SessionData>) -> WorkspaceData {
        WorkspaceData {
            directories: vec![DirectoryData {
                id: "d1".to_string(),
                name: "p".to_string(),
                path: "/p".to_string(),
                expanded: true,
                sessions,
            }],
            ..default_workspace()
        }
    }

    fn vsplit(children: Vec<LayoutNode>) -> LayoutNode {
        LayoutNode::new_split(SplitDirection::Vertical, children)
    }

    #[test]
    fn missing_layout_gets_single_pane() {
        let mut data = workspace_with(vec![session("s1", None, "")]);
        validate_workspace_data(&mut data);
        let s = data.session("s1").unwrap();
        assert_eq!(s.layout, Some(LayoutNode::pane("s1", "/p")));
        assert_eq!(s.active_pane_id, "s1");
    }

    #[test]
    fn dangling_active_pane_moves_to_first_leaf() {
        let layout = vsplit(vec![LayoutNode::pane("p1", "/p"), LayoutNode::pane("p2", "/p")]);
        let mut data = workspace_with(vec![session("s1", Some(layout), "gone")]);
        validate_workspace_data(&mut data);
        assert_eq!(data.session("s1").unwrap().active_pane_id, "p1");
    }

    #[test]
    fn pane_ids_are_unique_across_sessions() {
        let first = vsplit(vec![LayoutNode::pane("p1", "/p"), LayoutNode::pane("p2", "/p")]);
        let second = vsplit(vec![LayoutNode::pane("p2", "/p"), LayoutNode::pane("p3", "/p")]);
        let mut data = workspace_with(vec![session("s1", Some(first), "p1"), session("s2", Some(second), "p2")]);
        validate_workspace_data(&mut data);
        assert_eq!(data.session("s2").unwrap().pane_ids(), vec!["p3"]);
        assert_eq!(data.session("s2").unwrap().active_pane_id, "p3");
    }

    #[test]
    fn workspace_slots_drop_dead_sessions_and_bare_leaves() {
        let mut data = workspace_with(vec![session("a", None, ""), session("b", None, "")]);
        data.workspace_layout = Some(vsplit(vec![LayoutNode::session("a"), LayoutNode::session("gone")]));
        data.parked_layout = Some(vsplit(vec![LayoutNode::session("a"), LayoutNode::session("b")]));
        data.active_session_id = Some("gone".to_string());
        validate_workspace_data(&mut data);
        assert!(data.workspace_layout.is_none());
        assert_eq!(data.parked_layout.as_ref().unwrap().collect_leaf_ids(), vec!["a", "b"]);
        assert!(data.active_session_id.is_none());
    }

    #[test]
    fn recently_closed_for_removed_directory_is_dropped() {
        let mut data = workspace_with(vec![]);
        data.recently_closed = vec![
            ClosedSession { directory_id: "d1".into(), name: "x".into(), cwd: "/p".into(), closed_at: 0 },
            ClosedSession { directory_id: "d9".into(), name: "y".into(), cwd: "/q".into(), closed_at: 0 },
        ];
        validate_workspace_data(&mut data);
        assert_eq!(data.recently_closed.len(), 1);
    }

    #[test]
    fn save_and_load_round_trip_revalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");

        let mut data = workspace_with(vec![session("a", None, ""), session("b", None, "")]);
        data.workspace_layout = Some(vsplit(vec![LayoutNode::session("a"), LayoutNode::session("b")]));
        data.active_session_id = Some("a".to_string());
        validate_workspace_data(&mut data);
        save_workspace_to(&path, &data).unwrap();

        let loaded = load_workspace_from(&path).unwrap();
        assert_eq!(loaded, data);
        assert_eq!(loaded.version, WORKSPACE_VERSION);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let data = load_workspace_from(&dir.path().join("workspace.json")).unwrap();
        assert!(data.directories.is_empty());
        assert_eq!(data.version, WORKSPACE_VERSION);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        std::fs::write(&path, "[]").unwrap();
        let err = load_workspace_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }

    #[test]
    fn unversioned_file_is_migrated() {
        let data = migrate_workspace(WorkspaceData { version: 0, ..default_workspace() });
        assert_eq!(data.version, 1);
    }
}
