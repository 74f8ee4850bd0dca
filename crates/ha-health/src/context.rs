//! HaContext: everything the engine shares, built once and passed by reference.

use std::path::Path;
use std::sync::Arc;

use ha_core::config::HaConfig;
use ha_core::errors::HaResult;
use ha_core::traits::{EventPublisher, KvStore, NullPublisher};
use ha_store::HealthStore;

use crate::evaluator::EvaluatorRegistry;
use crate::resolver::ComponentResolver;
use crate::schema::HierarchySchema;
use crate::status_mapper::StatusMapper;

pub struct HaContext {
    pub config: HaConfig,
    pub store: HealthStore,
    pub schema: HierarchySchema,
    pub mapper: StatusMapper,
    pub resolver: ComponentResolver,
    pub evaluators: EvaluatorRegistry,
    publisher: Arc<dyn EventPublisher>,
}

impl HaContext {
    /// Build over an existing KV backend. Schema load failures are returned
    /// as errors and must abort startup.
    pub fn new(
        config: HaConfig,
        kv: Arc<dyn KvStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> HaResult<Self> {
        let store = HealthStore::new(kv, config.store.key_prefix.clone());
        let schema_path = config
            .health
            .schema_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Path::new);
        let schema = HierarchySchema::load(schema_path, store.prefix())?;
        let evaluators = EvaluatorRegistry::new(&schema, &config.health.fallback_overrides)?;
        let mapper = StatusMapper::new(&config.health.status_map);
        let resolver = ComponentResolver::new(&config.health.resource_map);
        Ok(Self {
            config,
            store,
            schema,
            mapper,
            resolver,
            evaluators,
            publisher,
        })
    }

    /// Open the configured KV backend and build on it.
    pub fn open(config: HaConfig, publisher: Arc<dyn EventPublisher>) -> HaResult<Self> {
        let kv = ha_store::open_kv_store(&config.store)?;
        Self::new(config, kv, publisher)
    }

    /// Default configuration over an in-memory store, publishing nowhere.
    pub fn in_memory() -> HaResult<Self> {
        Self::new(
            HaConfig::default(),
            Arc::new(ha_store::MemoryKvStore::new()),
            Arc::new(NullPublisher),
        )
    }

    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }
}

impl std::fmt::Debug for HaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HaContext")
            .field("store", &self.store)
            .field("components", &self.schema.iter().count())
            .field("evaluators", &self.evaluators.len())
            .finish()
    }
}
