//! In-memory backend that records every request.

use crate::backend::{BackendError, ProcessBackend};
use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Create { leaf_id: String, cwd: String },
    Write { leaf_id: String, data: Vec<u8> },
    Resize { leaf_id: String, cols: u16, rows: u16 },
    Kill { leaf_id: String },
}

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<BackendCall>>,
    live: Mutex<HashSet<String>>,
    fail_create: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `create` calls fail.
    pub fn fail_creates(&self, fail: bool) {
        *self.fail_create.lock() = fail;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn is_live(&self, leaf_id: &str) -> bool {
        self.live.lock().contains(leaf_id)
    }

    /// Leaf ids passed to `kill`, in call order
    pub fn killed(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BackendCall::Kill { leaf_id } => Some(leaf_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Leaf ids passed to `create`, in call order
    pub fn created(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BackendCall::Create { leaf_id, .. } => Some(leaf_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Bytes written to `leaf_id`, concatenated
    pub fn written(&self, leaf_id: &str) -> Vec<u8> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BackendCall::Write { leaf_id: id, data } if id == leaf_id => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl ProcessBackend for FakeBackend {
    fn create(&self, leaf_id: &str, cwd: &str) -> Result<(), BackendError> {
        self.calls.lock().push(BackendCall::Create {
            leaf_id: leaf_id.to_string(),
            cwd: cwd.to_string(),
        });
        if *self.fail_create.lock() {
            return Err(BackendError::Spawn {
                leaf_id: leaf_id.to_string(),
                message: "spawn disabled".to_string(),
            });
        }
        self.live.lock().insert(leaf_id.to_string());
        Ok(())
    }

    fn write(&self, leaf_id: &str, data: &[u8]) {
        self.calls.lock().push(BackendCall::Write {
            leaf_id: leaf_id.to_string(),
            data: data.to_vec(),
        });
    }

    fn resize(&self, leaf_id: &str, cols: u16, rows: u16) {
        self.calls.lock().push(BackendCall::Resize {
            leaf_id: leaf_id.to_string(),
            cols,
            rows,
        });
    }

    fn kill(&self, leaf_id: &str) -> Result<(), BackendError> {
        self.calls.lock().push(BackendCall::Kill {
            leaf_id: leaf_id.to_string(),
        });
        if self.live.lock().remove(leaf_id) {
            Ok(())
        } else {
            Err(BackendError::NotFound(leaf_id.to_string()))
        }
    }
}
