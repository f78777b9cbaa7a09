mod allocation;
pub mod chain;
mod error;
mod mutations;
mod queries;

pub use allocation::{allocation_for, bulk_allocations};
pub use error::EngineError;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::warn;

use crate::dispatcher::{DispatcherHandle, Notification};
use crate::model::*;
use crate::notify::NotifyHub;
use crate::snapshot::Snapshot;

// ── Snapshot writer channel ──────────────────────────────

enum SnapshotCommand {
    Save {
        state: Box<StudioState>,
    },
    Flush {
        response: oneshot::Sender<Result<(), String>>,
    },
}

/// Background task that owns the state document.
/// 1. Block until a Save arrives.
/// 2. Drain every immediately available Save, keeping only the newest state.
/// 3. Write that state once.
/// A Flush answers with the outcome of the last write, after every earlier Save.
async fn snapshot_writer_loop(snapshot: Snapshot, mut rx: mpsc::Receiver<SnapshotCommand>) {
    let mut last_result: Result<(), String> = Ok(());

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SnapshotCommand::Save { state } => {
                let mut latest = state;
                let mut coalesced = 1usize;
                let mut flush = None;

                loop {
                    match rx.try_recv() {
                        Ok(SnapshotCommand::Save { state }) => {
                            latest = state;
                            coalesced += 1;
                        }
                        Ok(SnapshotCommand::Flush { response }) => {
                            // Saves queued after this flush belong to the next batch.
                            flush = Some(response);
                            break;
                        }
                        Err(_) => break,
                    }
                }

                metrics::histogram!(crate::observability::SNAPSHOT_COALESCED_SAVES)
                    .record(coalesced as f64);
                last_result = write_snapshot(&snapshot, &latest);
                if let Some(response) = flush {
                    let _ = response.send(last_result.clone());
                }
            }
            SnapshotCommand::Flush { response } => {
                let _ = response.send(last_result.clone());
            }
        }
    }
}

fn write_snapshot(snapshot: &Snapshot, state: &StudioState) -> Result<(), String> {
    let start = std::time::Instant::now();
    let result = snapshot.write(state);
    metrics::histogram!(crate::observability::SNAPSHOT_WRITE_DURATION_SECONDS)
        .record(start.elapsed().as_secs_f64());
    result.map_err(|e| {
        warn!("failed to persist {}: {e}", snapshot.path().display());
        metrics::counter!(crate::observability::SNAPSHOT_WRITE_FAILURES_TOTAL).increment(1);
        e.to_string()
    })
}

/// One studio's state and the machinery around it.
///
/// Every mutation runs to completion under the write lock and swaps in the
/// changed collection, so readers never observe a half-applied transition.
pub struct Engine {
    pub(super) state: RwLock<StudioState>,
    snapshot_tx: mpsc::Sender<SnapshotCommand>,
    pub notify: Arc<NotifyHub>,
    pub(super) dispatcher: DispatcherHandle,
}

impl Engine {
    /// Load the tenant's state and start its snapshot writer. Must run inside a tokio runtime.
    pub fn new(snapshot: Snapshot, notify: Arc<NotifyHub>, dispatcher: DispatcherHandle) -> Self {
        let state = snapshot.load();
        let (snapshot_tx, snapshot_rx) = mpsc::channel(1024);
        tokio::spawn(snapshot_writer_loop(snapshot, snapshot_rx));

        Self {
            state: RwLock::new(state),
            snapshot_tx,
            notify,
            dispatcher,
        }
    }

    /// Queue the committed state for persistence and broadcast `event`.
    /// Persistence failures are logged by the writer, never returned.
    pub(super) async fn commit(&self, state: &StudioState, event: Event) {
        let save = SnapshotCommand::Save {
            state: Box::new(state.clone()),
        };
        if self.snapshot_tx.send(save).await.is_err() {
            warn!("snapshot writer shut down, change not persisted");
        }
        self.notify.send(&event);
    }

    pub(super) fn emit(&self, notification: Option<Notification>) {
        if let Some(notification) = notification {
            self.dispatcher.send(notification);
        }
    }

    /// Wait until every change committed so far has been written.
    pub async fn flush(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.snapshot_tx
            .send(SnapshotCommand::Flush { response: tx })
            .await
            .map_err(|_| EngineError::SnapshotError("snapshot writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::SnapshotError("snapshot writer dropped response".into()))?
            .map_err(EngineError::SnapshotError)
    }

    /// Copy of the whole state.
    pub async fn state(&self) -> StudioState {
        self.state.read().await.clone()
    }
}
