use crate::pty_manager::PtyEvent;
use async_channel::Receiver;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type DataCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;
type ExitCallback = Arc<dyn Fn() + Send + Sync>;

/// Routes PTY events to at most one data and one exit subscriber per leaf.
///
/// Subscribing again for the same leaf replaces the previous callback.
#[derive(Default)]
pub struct Subscriptions {
    data: Mutex<HashMap<String, DataCallback>>,
    exit: Mutex<HashMap<String, ExitCallback>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_data(&self, leaf_id: &str, callback: impl Fn(&[u8]) + Send + Sync + 'static) {
        self.data.lock().insert(leaf_id.to_string(), Arc::new(callback));
    }

    pub fn on_exit(&self, leaf_id: &str, callback: impl Fn() + Send + Sync + 'static) {
        self.exit.lock().insert(leaf_id.to_string(), Arc::new(callback));
    }

    /// Drop both subscriptions of a leaf
    pub fn unsubscribe(&self, leaf_id: &str) {
        self.data.lock().remove(leaf_id);
        self.exit.lock().remove(leaf_id);
    }

    pub fn is_subscribed(&self, leaf_id: &str) -> bool {
        self.data.lock().contains_key(leaf_id) || self.exit.lock().contains_key(leaf_id)
    }

    /// Deliver one event. Returns whether a subscriber received it.
    ///
    /// Callbacks run without the registry lock held, so they may subscribe or unsubscribe.
    pub fn dispatch(&self, event: &PtyEvent) -> bool {
        match event {
            PtyEvent::Data { leaf_id, data } => {
                let callback = self.data.lock().get(leaf_id).cloned();
                match callback {
                    Some(callback) => {
                        callback(data);
                        true
                    }
                    None => {
                        log::debug!("Dropping {} bytes for unsubscribed leaf {}", data.len(), leaf_id);
                        false
                    }
                }
            }
            PtyEvent::Exit { leaf_id } => {
                let callback = self.exit.lock().remove(leaf_id);
                self.data.lock().remove(leaf_id);
                match callback {
                    Some(callback) => {
                        callback();
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Dispatch events until every sender is gone.
    pub fn run(&self, events: &Receiver<PtyEvent>) {
        while let Ok(event) = events.recv_blocking() {
            self.dispatch(&event);
        }
    }
}
