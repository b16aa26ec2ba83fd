use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings schema version - increment when making breaking changes
pub const SETTINGS_VERSION: u32 = 1;

/// App settings (persisted separately from workspace)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Settings schema version for migration support
    #[serde(default = "default_settings_version")]
    pub version: u32,

    // Shell settings
    /// Shell program for new panes; empty uses $SHELL / the platform default
    #[serde(default)]
    pub default_shell: String,

    // Terminal settings
    /// Number of scrollback lines (default: 5000)
    #[serde(default = "default_scrollback_lines")]
    pub scrollback_lines: u32,
    /// Enable cursor blinking (default: true)
    #[serde(default = "default_cursor_blink")]
    pub cursor_blink: bool,

    // Font settings
    /// Terminal font size (default: 13.0)
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Line height multiplier (default: 1.3)
    #[serde(default = "default_line_height")]
    pub line_height: f32,

    // Workspace behavior
    /// Seconds between repository status polls (default: 3)
    #[serde(default = "default_git_poll_interval_secs")]
    pub git_poll_interval_secs: u64,
    /// How many closed sessions can be reopened (default: 10)
    #[serde(default = "default_recently_closed_limit")]
    pub recently_closed_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            default_shell: String::new(),
            scrollback_lines: default_scrollback_lines(),
            cursor_blink: default_cursor_blink(),
            font_size: default_font_size(),
            line_height: default_line_height(),
            git_poll_interval_secs: default_git_poll_interval_secs(),
            recently_closed_limit: default_recently_closed_limit(),
        }
    }
}

impl AppSettings {
    /// Shell for the process backend, `None` when the platform default applies
    pub fn shell(&self) -> Option<String> {
        let shell = self.default_shell.trim();
        (!shell.is_empty()).then(|| shell.to_string())
    }
}

fn default_settings_version() -> u32 {
    // Return 0 for settings files without version field (pre-versioning)
    0
}

fn default_scrollback_lines() -> u32 {
    5000
}

fn default_cursor_blink() -> bool {
    true
}

fn default_font_size() -> f32 {
    13.0
}

fn default_line_height() -> f32 {
    1.3
}

fn default_git_poll_interval_secs() -> u64 {
    3
}

fn default_recently_closed_limit() -> usize {
    10
}

/// Get the settings file path
pub fn get_settings_path() -> PathBuf {
    crate::persistence::get_config_dir().join("settings.json")
}

/// Load app settings from the default location
pub fn load_settings() -> AppSettings {
    load_settings_from(&get_settings_path())
}

/// Save app settings to the default location
pub fn save_settings(settings: &AppSettings) -> Result<()> {
    save_settings_to(&get_settings_path(), settings)
}

/// Load app settings from disk with robust error handling and migration support
pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        log::info!("Settings file not found at {}, using defaults", path.display());
        return AppSettings::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::error!("Failed to read settings file {}: {}", path.display(), e);
            return AppSettings::default();
        }
    };

    // Fast path for valid settings
    match serde_json::from_str::<AppSettings>(&content) {
        Ok(settings) => return migrate_settings(settings, path),
        Err(e) => {
            log::warn!("Failed to parse settings directly: {}, attempting partial recovery", e);
        }
    }

    match recover_settings_from_json(&content) {
        Ok(settings) => {
            log::info!("Successfully recovered settings with partial data");
            let settings = migrate_settings(settings, path);
            if let Err(e) = save_settings_to(path, &settings) {
                log::warn!("Failed to save recovered settings: {}", e);
            }
            settings
        }
        Err(e) => {
            log::error!("Failed to recover settings from {}: {:#}", path.display(), e);
            log::error!("Using default settings. Your old settings file has been preserved.");
            AppSettings::default()
        }
    }
}

/// Extract valid fields from a malformed settings file, defaulting the rest
fn recover_settings_from_json(content: &str) -> Result<AppSettings> {
    let value: serde_json::Value = serde_json::from_str(content).context("Settings file is not valid JSON")?;

    let obj = value.as_object().context("Settings file root is not a JSON object")?;

    let mut settings = AppSettings::default();

    if let Some(v) = obj.get("version").and_then(|v| v.as_u64()) {
        settings.version = v as u32;
    }

    if let Some(v) = obj.get("default_shell").and_then(|v| v.as_str()) {
        settings.default_shell = v.to_string();
    }

    if let Some(v) = obj.get("scrollback_lines").and_then(|v| v.as_u64()) {
        settings.scrollback_lines = v.clamp(100, 100_000) as u32;
    }

    if let Some(v) = obj.get("cursor_blink").and_then(|v| v.as_bool()) {
        settings.cursor_blink = v;
    }

    if let Some(v) = obj.get("font_size").and_then(|v| v.as_f64()) {
        settings.font_size = (v as f32).clamp(8.0, 48.0);
    }

    if let Some(v) = obj.get("line_height").and_then(|v| v.as_f64()) {
        settings.line_height = (v as f32).clamp(1.0, 3.0);
    }

    if let Some(v) = obj.get("git_poll_interval_secs").and_then(|v| v.as_u64()) {
        settings.git_poll_interval_secs = v.clamp(1, 3600);
    }

    if let Some(v) = obj.get("recently_closed_limit").and_then(|v| v.as_u64()) {
        settings.recently_closed_limit = v.min(100) as usize;
    }

    Ok(settings)
}

/// Migrate settings from older versions to the current version
fn migrate_settings(mut settings: AppSettings, path: &Path) -> AppSettings {
    let original_version = settings.version;

    // Migration from version 0 (pre-versioning) to version 1
    if settings.version == 0 {
        log::info!("Migrating settings from pre-versioning (v0) to v1");
        settings.version = 1;
    }

    if settings.version < SETTINGS_VERSION {
        log::warn!(
            "Settings version {} is older than current version {}, some settings may use defaults",
            original_version,
            SETTINGS_VERSION
        );
        settings.version = SETTINGS_VERSION;
    }

    if original_version != settings.version {
        log::info!("Settings migrated from v{} to v{}", original_version, settings.version);
        if let Err(e) = save_settings_to(path, &settings) {
            log::warn!("Failed to save migrated settings: {}", e);
        }
    }

    settings
}

/// Save app settings to disk
pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json"));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.git_poll_interval_secs, 3);
        assert_eq!(settings.recently_closed_limit, 10);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            default_shell: "/bin/bash".to_string(),
            font_size: 15.0,
            ..AppSettings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn unversioned_file_is_migrated_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"font_size": 16.0}"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.font_size, 16.0);

        let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["version"], SETTINGS_VERSION);
    }

    #[test]
    fn malformed_fields_are_recovered_individually() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "font_size": "huge", "scrollback_lines": 5, "cursor_blink": false, "recently_closed_limit": 4}"#,
        )
        .unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.font_size, 13.0);
        assert_eq!(settings.scrollback_lines, 100);
        assert!(!settings.cursor_blink);
        assert_eq!(settings.recently_closed_limit, 4);
    }

    #[test]
    fn invalid_json_keeps_defaults_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path), AppSettings::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn shell_empty_means_platform_default() {
        assert_eq!(AppSettings::default().shell(), None);
        let settings = AppSettings {
            default_shell: " /bin/zsh ".to_string(),
            ..AppSettings::default()
        };
        assert_eq!(settings.shell().as_deref(), Some("/bin/zsh"));
    }
}
