//! Workspace state: directories, sessions and their layouts, persisted to
//! the config directory.

pub mod actions;
pub mod data;
pub mod persistence;
pub mod settings;
pub mod state;

pub use actions::{LayoutTarget, PaneRect};
pub use data::{ClosedSession, DirectoryData, SessionData, WorkspaceData};
pub use settings::AppSettings;
pub use state::{Created, Workspace};
