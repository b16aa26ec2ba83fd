use crate::backend::{BackendError, ProcessBackend};
use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::mpsc;

const INITIAL_COLS: u16 = 80;
const INITIAL_ROWS: u16 = 24;

/// Events from PTY processes
#[derive(Debug, Clone, PartialEq)]
pub enum PtyEvent {
    /// Data received from PTY
    Data { leaf_id: String, data: Vec<u8> },
    /// PTY reached EOF or failed to read
    Exit { leaf_id: String },
}

/// Handle to a single PTY process
struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    /// Channel to send input to the writer thread
    input_tx: mpsc::Sender<Vec<u8>>,
}

/// Manages all PTY processes
pub struct PtyManager {
    terminals: Arc<Mutex<HashMap<String, PtyHandle>>>,
    event_tx: Sender<PtyEvent>,
    /// Shell program; `None` uses the platform default ($SHELL on unix)
    shell: Option<String>,
}

impl PtyManager {
    /// Create a new PTY manager
    pub fn new(shell: Option<String>) -> (Self, Receiver<PtyEvent>) {
        let (tx, rx) = async_channel::unbounded();
        (
            Self {
                terminals: Arc::new(Mutex::new(HashMap::new())),
                event_tx: tx,
                shell,
            },
            rx,
        )
    }

    pub fn is_running(&self, leaf_id: &str) -> bool {
        self.terminals.lock().contains_key(leaf_id)
    }

    fn spawn(&self, leaf_id: &str, cwd: &str) -> anyhow::Result<()> {
        let pty_system = native_pty_system();
        let pair = pty_system.openpty(PtySize {
            rows: INITIAL_ROWS,
            cols: INITIAL_COLS,
            pixel_width: 0,
            pixel_height: 0,
        })?;

        let cmd = self.build_command(cwd);
        let child = pair.slave.spawn_command(cmd)?;

        let reader = pair.master.try_clone_reader()?;
        let writer = pair.master.take_writer()?;

        let tx = self.event_tx.clone();
        let id = leaf_id.to_string();
        std::thread::spawn(move || {
            Self::read_loop(id, reader, tx);
        });

        let (input_tx, input_rx) = mpsc::channel::<Vec<u8>>();
        std::thread::spawn(move || {
            Self::write_loop(writer, input_rx);
        });

        self.terminals.lock().insert(
            leaf_id.to_string(),
            PtyHandle {
                master: pair.master,
                child,
                input_tx,
            },
        );
        Ok(())
    }

    fn build_command(&self, cwd: &str) -> CommandBuilder {
        let mut cmd = match &self.shell {
            Some(shell) => CommandBuilder::new(shell),
            None => CommandBuilder::new_default_prog(),
        };
        cmd.cwd(cwd);
        // App bundles and service managers don't inherit a login environment
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        cmd
    }

    /// Read loop for PTY output
    fn read_loop(leaf_id: String, mut reader: Box<dyn Read + Send>, tx: Sender<PtyEvent>) {
        let mut buf = [0u8; 65536];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.send_blocking(PtyEvent::Exit { leaf_id });
                    break;
                }
                Ok(n) => {
                    log::debug!("PTY {} received {} bytes", leaf_id, n);
                    let _ = tx.send_blocking(PtyEvent::Data {
                        leaf_id: leaf_id.clone(),
                        data: buf[..n].to_vec(),
                    });
                }
                Err(e) => {
                    log::error!("PTY read error: {}", e);
                    let _ = tx.send_blocking(PtyEvent::Exit { leaf_id });
                    break;
                }
            }
        }
    }

    /// Write loop for PTY input - batches pending writes
    fn write_loop(mut writer: Box<dyn Write + Send>, rx: mpsc::Receiver<Vec<u8>>) {
        while let Ok(first) = rx.recv() {
            let mut batch = first;
            while let Ok(data) = rx.try_recv() {
                batch.extend(data);
            }
            if let Err(e) = writer.write_all(&batch) {
                log::error!("Failed to write to PTY: {}", e);
                break;
            }
        }
    }

    /// Kill every process without consulting the layout
    pub fn kill_all(&self) {
        let mut terminals = self.terminals.lock();
        for (_, mut handle) in terminals.drain() {
            let _ = handle.child.kill();
        }
    }
}

impl ProcessBackend for PtyManager {
    fn create(&self, leaf_id: &str, cwd: &str) -> Result<(), BackendError> {
        if self.is_running(leaf_id) {
            return Ok(());
        }
        self.spawn(leaf_id, cwd).map_err(|e| BackendError::Spawn {
            leaf_id: leaf_id.to_string(),
            message: format!("{:#}", e),
        })?;
        log::info!("Spawned PTY for {} in {}", leaf_id, cwd);
        Ok(())
    }

    fn write(&self, leaf_id: &str, data: &[u8]) {
        if let Some(handle) = self.terminals.lock().get(leaf_id) {
            let _ = handle.input_tx.send(data.to_vec());
        }
    }

    fn resize(&self, leaf_id: &str, cols: u16, rows: u16) {
        if let Some(handle) = self.terminals.lock().get(leaf_id) {
            if let Err(e) = handle.master.resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            }) {
                log::error!("Failed to resize PTY: {}", e);
            }
        }
    }

    fn kill(&self, leaf_id: &str) -> Result<(), BackendError> {
        let mut handle = self
            .terminals
            .lock()
            .remove(leaf_id)
            .ok_or_else(|| BackendError::NotFound(leaf_id.to_string()))?;
        handle.child.kill().map_err(|source| BackendError::Kill {
            leaf_id: leaf_id.to_string(),
            source,
        })
    }
}

impl Drop for PtyManager {
    fn drop(&mut self) {
        self.kill_all();
    }
}
