//! ActionDispatcher: bounded hand-off from rule evaluation to the action handler.
//!
//! `dispatch` never blocks: when the queue is full the actions are dropped
//! and logged. A single worker thread drains the queue into the
//! [`ActionHandler`]; handler errors and panics are logged and counted.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use serde::Serialize;

use ha_core::models::HealthEvent;
use ha_core::tracing::events;
use ha_core::traits::ActionHandler;

struct ActionJob {
    event: HealthEvent,
    actions: Vec<String>,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicU64,
    dropped: AtomicU64,
    handled: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub queued: u64,
    /// Rejected because the queue was full or closed.
    pub dropped: u64,
    pub handled: u64,
    pub failed: u64,
}

pub struct ActionDispatcher {
    tx: Sender<ActionJob>,
    stop_tx: Sender<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl ActionDispatcher {
    /// Start the worker thread with a queue of `capacity` jobs.
    pub fn start(handler: Arc<dyn ActionHandler>, capacity: usize) -> std::io::Result<Self> {
        let (tx, rx) = bounded(capacity.max(1));
        let (stop_tx, stop_rx) = bounded(1);
        let counters = Arc::new(Counters::default());
        let worker_counters = Arc::clone(&counters);
        let worker = thread::Builder::new()
            .name("ha-action-dispatcher".to_string())
            .spawn(move || work(handler, rx, stop_rx, worker_counters))?;
        Ok(Self {
            tx,
            stop_tx,
            worker: Mutex::new(Some(worker)),
            counters,
        })
    }

    /// Queue `actions` for `event`. Returns whether they were accepted.
    pub fn dispatch(&self, event: &HealthEvent, actions: Vec<String>) -> bool {
        let job = ActionJob {
            event: event.clone(),
            actions,
        };
        match self.tx.try_send(job) {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                events::action_queue_full(&job.event.resource_id, &job.actions);
                false
            }
        }
    }

    /// Jobs waiting for the worker.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            queued: self.counters.queued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            handled: self.counters.handled.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Drain what is queued, then stop the worker. Idempotent.
    pub fn shutdown(&self) {
        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };
        let _ = self.stop_tx.try_send(());
        if handle.join().is_err() {
            tracing::error!("action dispatcher worker panicked");
        }
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn work(
    handler: Arc<dyn ActionHandler>,
    rx: Receiver<ActionJob>,
    stop_rx: Receiver<()>,
    counters: Arc<Counters>,
) {
    loop {
        select! {
            recv(rx) -> job => match job {
                Ok(job) => run(handler.as_ref(), job, &counters),
                Err(_) => break,
            },
            recv(stop_rx) -> _ => {
                for job in rx.try_iter() {
                    run(handler.as_ref(), job, &counters);
                }
                break;
            }
        }
    }
    tracing::debug!("action dispatcher stopped");
}

fn run(handler: &dyn ActionHandler, job: ActionJob, counters: &Counters) {
    events::action_dispatched(&job.event.resource_id, &job.actions);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&job.event, &job.actions)));
    match outcome {
        Ok(Ok(())) => {
            counters.handled.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Err(e)) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(resource_id = %job.event.resource_id, actions = ?job.actions, error = %e, "action handler failed");
        }
        Err(_) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(resource_id = %job.event.resource_id, actions = ?job.actions, "action handler panicked");
        }
    }
}
