// src/chat/autosave.rs - Periodic persistence safety net
//
// Eager saves happen on every mutation; this task re-saves the working copy
// on a fixed interval in case one was missed. It is started once at process
// start and stopped at shutdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::manager::SessionManager;

pub struct PersistScheduler {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<u64>,
}

impl PersistScheduler {
    /// Spawn the save loop. Must be called inside a tokio runtime.
    pub fn start(manager: Arc<Mutex<SessionManager>>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Consume the immediate first tick
            ticker.tick().await;
            let mut saves = 0u64;
            tracing::debug!("Autosave started ({}s interval)", interval.as_secs());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut guard = manager.lock().unwrap_or_else(|e| e.into_inner());
                        guard.persist();
                        saves += 1;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("Autosave stopping after {} periodic save(s)", saves);
                        break;
                    }
                }
            }
            saves
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the loop and wait for it. Returns how many periodic saves ran.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown_tx.send(());
        match self.handle.await {
            Ok(saves) => saves,
            Err(e) => {
                tracing::warn!("Autosave task ended abnormally: {}", e);
                0
            }
        }
    }
}
