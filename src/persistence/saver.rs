use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument};

use super::snapshot::{PersistedMatch, SNAPSHOT_KEY};
use super::store::KeyValueStore;

/// Configuration for the snapshot saver task
#[derive(Debug, Clone)]
pub struct SaverConfig {
    /// Quiet period after the last change before the snapshot is written
    pub debounce: Duration,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
enum SaverCommand {
    Save(Box<PersistedMatch>),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Handle to the background task that writes match snapshots.
///
/// Bursts of changes collapse into one write of the latest snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotSaver {
    commands: mpsc::UnboundedSender<SaverCommand>,
}

impl SnapshotSaver {
    /// Spawns the saver task on the current runtime
    pub fn spawn(store: Arc<dyn KeyValueStore>, config: SaverConfig) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_saver(store, config, receiver));
        (Self { commands }, handle)
    }

    /// Replaces any pending snapshot and restarts the quiet period
    pub fn schedule(&self, snapshot: PersistedMatch) {
        self.send(SaverCommand::Save(Box::new(snapshot)));
    }

    /// Drops any pending snapshot and removes the stored one
    pub fn clear(&self) {
        self.send(SaverCommand::Clear);
    }

    /// Writes the pending snapshot now and waits for the write to finish
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.send(SaverCommand::Flush(done));
        let _ = wait.await;
    }

    fn send(&self, command: SaverCommand) {
        if self.commands.send(command).is_err() {
            error!("Snapshot saver is no longer running");
        }
    }
}

#[instrument(skip_all, fields(debounce_ms = config.debounce.as_millis() as u64))]
async fn run_saver(
    store: Arc<dyn KeyValueStore>,
    config: SaverConfig,
    mut receiver: mpsc::UnboundedReceiver<SaverCommand>,
) {
    info!("Starting snapshot saver task");

    let mut pending: Option<Box<PersistedMatch>> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            command = receiver.recv() => match command {
                Some(SaverCommand::Save(snapshot)) => {
                    pending = Some(snapshot);
                    deadline = Some(Instant::now() + config.debounce);
                }
                Some(SaverCommand::Clear) => {
                    pending = None;
                    deadline = None;
                    if let Err(e) = store.remove(SNAPSHOT_KEY).await {
                        error!(error = %e, "Failed to clear stored snapshot");
                    }
                }
                Some(SaverCommand::Flush(done)) => {
                    deadline = None;
                    if let Some(snapshot) = pending.take() {
                        write_snapshot(store.as_ref(), &snapshot).await;
                    }
                    let _ = done.send(());
                }
                None => {
                    if let Some(snapshot) = pending.take() {
                        write_snapshot(store.as_ref(), &snapshot).await;
                    }
                    info!("Snapshot saver stopped");
                    break;
                }
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                if let Some(snapshot) = pending.take() {
                    write_snapshot(store.as_ref(), &snapshot).await;
                }
            }
        }
    }
}

async fn write_snapshot(store: &dyn KeyValueStore, snapshot: &PersistedMatch) {
    let json = match snapshot.to_json() {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Failed to serialize snapshot");
            return;
        }
    };

    match store.set(SNAPSHOT_KEY, &json).await {
        Ok(()) => debug!(bytes = json.len(), "Snapshot written"),
        Err(e) => error!(error = %e, "Failed to write snapshot"),
    }
}
