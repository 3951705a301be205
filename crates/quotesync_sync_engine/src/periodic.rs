//! Recurring sync task.

use crate::config::MIN_INTERVAL;
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::transport::RemoteStub;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to a named recurring sync task.
///
/// The first cycle runs one interval after start. Overlapping ticks are
/// skipped by the engine's single-flight guard. Dropping the handle aborts
/// the task, cancelling any in-flight cycle, after which the engine is back
/// in `Idle`. [`PeriodicSync::stop`] lets an in-flight cycle finish first.
#[derive(Debug)]
pub struct PeriodicSync {
    name: String,
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicSync {
    pub(crate) fn spawn<R>(engine: Arc<SyncEngine<R>>, interval: Duration, name: String) -> Self
    where
        R: RemoteStub + 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let task_name = name.clone();
        let interval = interval.max(MIN_INTERVAL);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(task = %task_name, ?interval, "periodic sync started");

            loop {
                tokio::select! {
                    biased;
                    _ = signal.notified() => break,
                    _ = ticker.tick() => match engine.sync().await {
                        Ok(_) => {}
                        Err(SyncError::SyncInProgress) => {
                            tracing::debug!(task = %task_name, "skipping tick, sync already running");
                        }
                        Err(e) => {
                            tracing::warn!(task = %task_name, error = %e, "periodic sync failed");
                        }
                    },
                }
            }
            tracing::debug!(task = %task_name, "periodic sync stopped");
        });

        Self {
            name,
            shutdown,
            handle: Some(handle),
        }
    }

    /// The task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the task has not finished.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the task and waits for it to exit.
    ///
    /// No cycle starts after this is called. A cycle already running
    /// completes before this returns.
    pub async fn stop(mut self) {
        self.shutdown.notify_one();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(task = %self.name, error = %e, "periodic sync task exited abnormally");
            }
        }
    }
}

impl Drop for PeriodicSync {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
