//! EventAnalyzer: owns the configured watchers and their threads.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use ha_core::config::PipelineConfig;
use ha_core::errors::{HaResult, PipelineError};
use ha_core::traits::{MessageBus, Subscriber};
use ha_store::HealthStore;

use crate::stats::StatsSnapshot;
use crate::watcher::Watcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Stopped,
}

struct Threads {
    state: RunState,
    handles: Vec<(String, JoinHandle<()>)>,
}

/// One watcher per configured (topic, consumer group), all feeding the same
/// subscriber. Consumers are opened at construction; threads start on
/// [`start`](Self::start). An analyzer runs once: after
/// [`shutdown`](Self::shutdown) its consumers are closed for good.
pub struct EventAnalyzer {
    watchers: Vec<Arc<Watcher>>,
    threads: Mutex<Threads>,
}

impl EventAnalyzer {
    pub fn new(
        config: &PipelineConfig,
        bus: &dyn MessageBus,
        store: &HealthStore,
        subscriber: Arc<dyn Subscriber>,
    ) -> HaResult<Self> {
        let watchers = config
            .watchers
            .iter()
            .map(|w| Watcher::from_config(w, config, bus, store, Arc::clone(&subscriber)).map(Arc::new))
            .collect::<HaResult<Vec<_>>>()?;
        Ok(Self::from_watchers(watchers))
    }

    pub fn from_watchers(watchers: Vec<Arc<Watcher>>) -> Self {
        Self {
            watchers,
            threads: Mutex::new(Threads {
                state: RunState::Idle,
                handles: Vec::new(),
            }),
        }
    }

    pub fn watchers(&self) -> &[Arc<Watcher>] {
        &self.watchers
    }

    pub fn is_running(&self) -> bool {
        self.lock().map(|t| t.state == RunState::Running).unwrap_or(false)
    }

    /// Spawn one thread per watcher.
    pub fn start(&self) -> HaResult<()> {
        let mut threads = self.lock()?;
        match threads.state {
            RunState::Idle => {}
            RunState::Running => {
                return Err(PipelineError::AlreadyRunning {
                    name: "event analyzer".to_string(),
                }
                .into())
            }
            RunState::Stopped => {
                return Err(PipelineError::Bus {
                    message: "event analyzer was shut down".to_string(),
                }
                .into())
            }
        }
        for watcher in &self.watchers {
            let handle = Arc::clone(watcher).spawn().map_err(|e| PipelineError::Bus {
                message: format!("spawn {}: {e}", watcher.name()),
            });
            match handle {
                Ok(handle) => threads.handles.push((watcher.name().to_string(), handle)),
                Err(e) => {
                    // Leave nothing half-started behind.
                    drop(threads);
                    let _ = self.shutdown();
                    return Err(e.into());
                }
            }
        }
        threads.state = RunState::Running;
        tracing::info!(version = ha_core::constants::VERSION, watchers = self.watchers.len(), "event analyzer started");
        Ok(())
    }

    /// Stop every consumer with flush, then join the threads. Reports the
    /// first watcher thread that panicked after all have been joined.
    pub fn shutdown(&self) -> HaResult<()> {
        let mut threads = self.lock()?;
        for watcher in &self.watchers {
            watcher.stop(true);
        }
        let mut panicked = None;
        for (name, handle) in threads.handles.drain(..) {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(name);
            }
        }
        threads.state = RunState::Stopped;
        tracing::info!("event analyzer stopped");
        match panicked {
            Some(name) => Err(PipelineError::WatcherPanicked { name }.into()),
            None => Ok(()),
        }
    }

    /// Per-watcher counters, in configuration order.
    pub fn stats(&self) -> Vec<(String, StatsSnapshot)> {
        self.watchers
            .iter()
            .map(|w| (w.name().to_string(), w.stats()))
            .collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Threads>, PipelineError> {
        self.threads.lock().map_err(|_| PipelineError::Bus {
            message: "analyzer state lock poisoned".to_string(),
        })
    }
}

impl Drop for EventAnalyzer {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.shutdown();
        }
    }
}
