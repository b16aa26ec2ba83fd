//! Process plumbing for layout leaves: one PTY per pane, keyed by leaf id.

pub mod backend;
pub mod pty_manager;
pub mod subscriptions;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use backend::{BackendError, ProcessBackend};
pub use pty_manager::{PtyEvent, PtyManager};
pub use subscriptions::Subscriptions;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{BackendCall, FakeBackend};
