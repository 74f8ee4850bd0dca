//! HealthMonitorService: the monitor wired to the published event topic.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use ha_core::config::{HaConfig, MessageKind, WatcherConfig};
use ha_core::errors::{HaResult, PipelineError};
use ha_core::traits::{ActionHandler, MessageBus};
use ha_pipeline::Watcher;
use ha_store::HealthStore;

use crate::dispatcher::ActionDispatcher;
use crate::monitor::HealthMonitor;
use crate::rule_store::RuleStore;

/// Consumes canonical events from `pipeline.publish_topic` with the monitor's
/// own consumer group and feeds them to a [`HealthMonitor`]. Configured
/// `monitor.rules` are merged into the rule table on construction.
pub struct HealthMonitorService {
    enabled: bool,
    monitor: Arc<HealthMonitor>,
    watcher: Arc<Watcher>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitorService {
    pub fn new(
        config: &HaConfig,
        bus: &dyn MessageBus,
        store: &HealthStore,
        handler: Arc<dyn ActionHandler>,
    ) -> HaResult<Self> {
        let rules = RuleStore::new(store.clone(), config.health.max_update_retries);
        rules.bootstrap(&config.monitor.rules)?;

        let dispatcher = ActionDispatcher::start(handler, config.monitor.action_queue_size)
            .map_err(|e| PipelineError::Bus {
                message: format!("spawn action dispatcher: {e}"),
            })?;
        let monitor = Arc::new(HealthMonitor::new(rules, Arc::new(dispatcher)));

        let watcher_config = WatcherConfig {
            message_type: config.pipeline.publish_topic.clone(),
            consumer_group: config.monitor.consumer_group.clone(),
            kind: MessageKind::Canonical,
        };
        let watcher = Watcher::from_config(
            &watcher_config,
            &config.pipeline,
            bus,
            store,
            Arc::clone(&monitor) as Arc<dyn ha_core::traits::Subscriber>,
        )?;

        Ok(Self {
            enabled: config.monitor.enabled,
            monitor,
            watcher: Arc::new(watcher),
            handle: Mutex::new(None),
        })
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    pub fn watcher(&self) -> &Arc<Watcher> {
        &self.watcher
    }

    /// Start consuming. A disabled monitor logs and stays idle.
    pub fn start(&self) -> HaResult<()> {
        if !self.enabled {
            tracing::info!("health monitor disabled by configuration");
            return Ok(());
        }
        let mut handle = self.lock()?;
        if handle.is_some() {
            return Err(PipelineError::AlreadyRunning {
                name: self.watcher.name().to_string(),
            }
            .into());
        }
        let spawned = Arc::clone(&self.watcher).spawn().map_err(|e| PipelineError::Bus {
            message: format!("spawn {}: {e}", self.watcher.name()),
        })?;
        *handle = Some(spawned);
        tracing::info!(watcher = %self.watcher.name(), "health monitor started");
        Ok(())
    }

    /// Stop the consumer, join it, then drain queued actions.
    pub fn shutdown(&self) -> HaResult<()> {
        self.watcher.stop(true);
        let handle = self.lock()?.take();
        let joined = match handle {
            Some(handle) => handle.join().map_err(|_| PipelineError::WatcherPanicked {
                name: self.watcher.name().to_string(),
            }),
            None => Ok(()),
        };
        self.monitor.dispatcher().shutdown();
        tracing::info!("health monitor stopped");
        joined.map_err(Into::into)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<JoinHandle<()>>>, PipelineError> {
        self.handle.lock().map_err(|_| PipelineError::Bus {
            message: "monitor state lock poisoned".to_string(),
        })
    }
}
