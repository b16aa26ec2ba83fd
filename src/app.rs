use anyhow::Result;
use async_channel::Receiver;
use grove_git::{GitCli, VersionControlQuery};
use grove_layout::SplitDirection;
use grove_state::persistence::{self, default_workspace};
use grove_state::settings::{self, AppSettings};
use grove_state::{Created, PaneRect, Workspace, WorkspaceData};
use grove_terminal::{BackendError, ProcessBackend, PtyEvent, PtyManager, Subscriptions};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Locations of the persisted files
pub struct Paths {
    pub workspace: PathBuf,
    pub settings: PathBuf,
}

impl Paths {
    pub fn new(config_dir: Option<PathBuf>) -> Self {
        match config_dir {
            Some(dir) => Self {
                workspace: dir.join("workspace.json"),
                settings: dir.join("settings.json"),
            },
            None => Self {
                workspace: persistence::get_workspace_path(),
                settings: settings::get_settings_path(),
            },
        }
    }
}

/// Backend for editing the saved workspace without running any process
pub struct DetachedBackend;

impl ProcessBackend for DetachedBackend {
    fn create(&self, _leaf_id: &str, _cwd: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn write(&self, _leaf_id: &str, _data: &[u8]) {}

    fn resize(&self, _leaf_id: &str, _cols: u16, _rows: u16) {}

    fn kill(&self, _leaf_id: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

fn load_data(paths: &Paths) -> WorkspaceData {
    persistence::load_workspace_from(&paths.workspace).unwrap_or_else(|e| {
        log::warn!("Failed to load workspace: {:#}, using default", e);
        default_workspace()
    })
}

/// Open the saved workspace against a backend that spawns nothing
pub fn open_detached(paths: &Paths) -> Workspace {
    let settings = settings::load_settings_from(&paths.settings);
    Workspace::with_settings(load_data(paths), Arc::new(DetachedBackend), &settings)
}

#[derive(Serialize)]
struct Snapshot<'a> {
    data: &'a WorkspaceData,
    visible_sessions: Vec<String>,
    panes: Vec<PaneRect>,
}

/// Print the workspace and the screen projection of its visible panes
pub fn dump(paths: &Paths, cols: u16, rows: u16) -> Result<()> {
    let workspace = open_detached(paths);
    let snapshot = Snapshot {
        data: workspace.data(),
        visible_sessions: workspace.visible_sessions(),
        panes: workspace.layout_rects(cols, rows),
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Add a directory with one session and save
pub fn add(paths: &Paths, path: &str, name: Option<&str>) -> Result<()> {
    let mut workspace = open_detached(paths);
    let directory_id = match workspace.data().directories.iter().find(|d| d.path == path) {
        Some(directory) => directory.id.clone(),
        None => workspace.add_directory(path),
    };
    let name = name.map(str::to_string).unwrap_or_else(|| {
        Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string()
    });
    if let Some(created) = workspace.add_session(&directory_id, &name, path) {
        log::info!("Added session {} ({})", name, grove_core::id::short(&created.id));
    }
    persistence::save_workspace_to(&paths.workspace, workspace.data())
}

/// Split the active pane of the active session and save
pub fn split(paths: &Paths, direction: SplitDirection) -> Result<()> {
    let mut workspace = open_detached(paths);
    let Some(session) = workspace.active_session() else {
        anyhow::bail!("No active session");
    };
    let (session_id, pane_id) = (session.id.clone(), session.active_pane_id.clone());
    if workspace.split_pane(&session_id, &pane_id, direction).is_none() {
        anyhow::bail!("Active pane {} not found in session {}", pane_id, session_id);
    }
    persistence::save_workspace_to(&paths.workspace, workspace.data())
}

/// Headless session runner
///
/// Spawns every visible pane, mirrors their output to stdout and forwards
/// stdin lines to the focused pane. Lines starting with `:` are commands.
pub struct Runner {
    paths: Paths,
    settings: AppSettings,
    workspace: Arc<Mutex<Workspace>>,
    subscriptions: Arc<Subscriptions>,
    pty_manager: Arc<PtyManager>,
    running: Arc<AtomicBool>,
    cols: u16,
    rows: u16,
}

impl Runner {
    pub fn new(paths: Paths, cols: u16, rows: u16) -> (Self, Receiver<PtyEvent>) {
        let settings = settings::load_settings_from(&paths.settings);
        let (pty_manager, pty_events) = PtyManager::new(settings.shell());
        let pty_manager = Arc::new(pty_manager);
        let workspace = Workspace::with_settings(load_data(&paths), pty_manager.clone(), &settings);
        (
            Self {
                paths,
                settings,
                workspace: Arc::new(Mutex::new(workspace)),
                subscriptions: Arc::new(Subscriptions::new()),
                pty_manager,
                running: Arc::new(AtomicBool::new(true)),
                cols,
                rows,
            },
            pty_events,
        )
    }

    pub fn run(self, pty_events: Receiver<PtyEvent>) -> Result<()> {
        {
            let workspace = self.workspace.lock();
            if workspace.visible_sessions().is_empty() {
                anyhow::bail!("Nothing to run: add a session first");
            }
            let failures = workspace.spawn_visible_panes();
            if failures > 0 {
                log::warn!("{} panes failed to spawn", failures);
            }
        }
        self.refresh_screen();

        let subscriptions = self.subscriptions.clone();
        std::thread::spawn(move || subscriptions.run(&pty_events));
        self.spawn_autosave();
        self.spawn_git_poller();

        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            if let Some(command) = line.strip_prefix(':') {
                self.command(command.trim());
            } else {
                let sent = self.workspace.lock().send_input(format!("{}\n", line).as_bytes());
                log::debug!("Input sent to {} panes", sent);
            }
        }

        self.running.store(false, Ordering::Relaxed);
        let data = self.workspace.lock().data().clone();
        persistence::save_workspace_to(&self.paths.workspace, &data)?;
        self.pty_manager.kill_all();
        Ok(())
    }

    fn command(&self, command: &str) {
        let mut workspace = self.workspace.lock();
        let focused = workspace
            .active_session()
            .map(|s| (s.id.clone(), s.active_pane_id.clone()));
        match (command, focused) {
            ("split-right", Some((session_id, pane_id))) => {
                let created = workspace.split_pane(&session_id, &pane_id, SplitDirection::Vertical);
                warn_spawn_failure(created);
            }
            ("split-down", Some((session_id, pane_id))) => {
                let created = workspace.split_pane(&session_id, &pane_id, SplitDirection::Horizontal);
                warn_spawn_failure(created);
            }
            ("close", Some((session_id, pane_id))) => match workspace.close_pane(&session_id, &pane_id) {
                None => log::warn!("Cannot close the last pane of a session"),
                Some(Err(e)) => log::warn!("Pane closed but its process was not killed: {}", e),
                Some(Ok(())) => {}
            },
            ("broadcast", _) => {
                workspace.toggle_broadcast();
            }
            (other, _) => log::warn!("Unknown command or no active session: {}", other),
        }
        drop(workspace);
        self.refresh_screen();
    }

    /// Resize every visible pane and route its output to stdout
    fn refresh_screen(&self) {
        let workspace = self.workspace.lock();
        workspace.sync_pty_sizes(self.cols, self.rows);
        for pane in workspace.layout_rects(self.cols, self.rows) {
            if self.subscriptions.is_subscribed(&pane.pane_id) {
                continue;
            }
            self.subscriptions.on_data(&pane.pane_id, |data| {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(data);
                let _ = stdout.flush();
            });
            let pane_id = pane.pane_id.clone();
            self.subscriptions.on_exit(&pane.pane_id, move || {
                log::info!("Pane {} exited", grove_core::id::short(&pane_id));
            });
        }
    }

    /// Save after the data version settles
    fn spawn_autosave(&self) {
        let workspace = self.workspace.clone();
        let running = self.running.clone();
        let path = self.paths.workspace.clone();
        std::thread::spawn(move || {
            let mut saved_version = workspace.lock().data_version();
            while running.load(Ordering::Relaxed) {
                std::thread::sleep(SAVE_DEBOUNCE);
                let (version, data) = {
                    let workspace = workspace.lock();
                    let version = workspace.data_version();
                    if version == saved_version {
                        continue;
                    }
                    (version, workspace.data().clone())
                };
                if let Err(e) = persistence::save_workspace_to(&path, &data) {
                    log::error!("Failed to save workspace: {:#}", e);
                }
                saved_version = version;
            }
        });
    }

    fn spawn_git_poller(&self) {
        let workspace = self.workspace.clone();
        let running = self.running.clone();
        let interval = Duration::from_secs(self.settings.git_poll_interval_secs.max(1));
        std::thread::spawn(move || {
            let git = GitCli::new(interval);
            while running.load(Ordering::Relaxed) {
                // git runs unlocked; sessions removed meanwhile are skipped on apply
                let targets = workspace.lock().git_targets();
                let samples = targets
                    .into_iter()
                    .map(|(id, cwd)| {
                        let status = git.status(Path::new(&cwd));
                        (id, status)
                    })
                    .collect();
                let changed = workspace.lock().apply_git_statuses(samples);
                if changed > 0 {
                    log::debug!("Git status changed for {} sessions", changed);
                }
                std::thread::sleep(interval);
            }
        });
    }
}

fn warn_spawn_failure(created: Option<Created>) {
    if let Some(Created { id, spawn: Err(e) }) = created {
        log::warn!("Pane {} was added but failed to start: {}", grove_core::id::short(&id), e);
    }
}
