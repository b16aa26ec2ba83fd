use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to spawn process for {leaf_id}: {message}")]
    Spawn { leaf_id: String, message: String },
    #[error("no process for leaf {0}")]
    NotFound(String),
    #[error("failed to kill process for {leaf_id}: {source}")]
    Kill {
        leaf_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Process lifecycle management trait.
///
/// Every request is keyed by leaf id only. Callers issue `kill` in the same
/// step as removing the leaf from its tree.
pub trait ProcessBackend: Send + Sync {
    fn create(&self, leaf_id: &str, cwd: &str) -> Result<(), BackendError>;
    fn write(&self, leaf_id: &str, data: &[u8]);
    fn resize(&self, leaf_id: &str, cols: u16, rows: u16);
    fn kill(&self, leaf_id: &str) -> Result<(), BackendError>;
}
