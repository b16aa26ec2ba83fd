//! Version-control status for session working directories.

use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Default cache TTL, one poll interval
pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

/// Branch and working-tree summary of a repository
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsStatus {
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
    /// Number of changed or untracked entries
    pub changed: u32,
}

impl VcsStatus {
    pub fn has_changes(&self) -> bool {
        self.changed > 0
    }
}

/// Status lookup used by the state layer.
///
/// `None` means the path is not inside a repository or the query failed.
pub trait VersionControlQuery: Send + Sync {
    fn status(&self, path: &Path) -> Option<VcsStatus>;
}

/// Parse the output of `git status --porcelain --branch`.
pub fn parse_status(output: &str) -> VcsStatus {
    let mut lines = output.lines();
    let first = lines.next().unwrap_or_default();
    let branch_line = first.replacen("## No commits yet on ", "## ", 1);

    static BRANCH_REGEX: OnceLock<Regex> = OnceLock::new();
    static AHEAD_BEHIND_REGEX: OnceLock<Regex> = OnceLock::new();
    let branch_regex = BRANCH_REGEX
        .get_or_init(|| Regex::new(r"^## (.+?)(?:\.\.\.(\S+))?(?:\s|$)").expect("branch regex should compile"));
    let ahead_behind_regex = AHEAD_BEHIND_REGEX.get_or_init(|| {
        Regex::new(r"\[ahead (\d+)(?:, behind (\d+))?\]|\[behind (\d+)\]").expect("ahead/behind regex should compile")
    });

    let mut status = VcsStatus::default();
    if let Some(caps) = branch_regex.captures(&branch_line) {
        status.branch = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
    }
    if let Some(caps) = ahead_behind_regex.captures(&branch_line) {
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok());
        status.ahead = number(1).unwrap_or(0);
        status.behind = number(2).or_else(|| number(3)).unwrap_or(0);
    }
    status.changed = lines.filter(|l| !l.trim().is_empty()).count() as u32;
    status
}

/// Cached git status entry
struct CacheEntry {
    status: Option<VcsStatus>,
    timestamp: Instant,
}

/// `git` CLI backed query with a per-path TTL cache.
pub struct GitCli {
    ttl: Duration,
    cache: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl GitCli {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn run(path: &Path) -> Option<VcsStatus> {
        let output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["status", "--porcelain", "--branch"])
            .output()
            .ok()?;
        if !output.status.success() {
            log::debug!("git status failed in {}", path.display());
            return None;
        }
        Some(parse_status(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl VersionControlQuery for GitCli {
    fn status(&self, path: &Path) -> Option<VcsStatus> {
        if let Some(entry) = self.cache.lock().get(path) {
            if entry.timestamp.elapsed() < self.ttl {
                return entry.status.clone();
            }
        }

        let status = Self::run(path);
        self.cache.lock().insert(
            path.to_path_buf(),
            CacheEntry {
                status: status.clone(),
                timestamp: Instant::now(),
            },
        );
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tracking_branch_with_ahead_and_behind() {
        let status = parse_status("## main...origin/main [ahead 2, behind 3]\n M src/lib.rs\n?? notes.txt\n");
        assert_eq!(
            status,
            VcsStatus {
                branch: "main".to_string(),
                ahead: 2,
                behind: 3,
                changed: 2,
            }
        );
        assert!(status.has_changes());
    }

    #[test]
    fn parses_behind_only() {
        let status = parse_status("## feature/x...origin/feature/x [behind 4]\n");
        assert_eq!(status.branch, "feature/x");
        assert_eq!(status.ahead, 0);
        assert_eq!(status.behind, 4);
        assert_eq!(status.changed, 0);
    }

    #[test]
    fn parses_local_branch_and_fresh_repo() {
        assert_eq!(parse_status("## dev\n").branch, "dev");
        assert_eq!(parse_status("## No commits yet on main\n").branch, "main");
    }

    #[test]
    fn empty_output_is_default() {
        assert_eq!(parse_status(""), VcsStatus::default());
    }

    #[test]
    fn non_repo_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::default();
        // Either git is missing or the directory is not a repository
        assert!(git.status(dir.path()).is_none());
    }
}
