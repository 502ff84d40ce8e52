//! Shared test harness: an in-memory metadata store plus a pool of
//! in-memory providers behind one `MulticloudFs`.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use stratus_core::chunk::ProviderId;
use stratus_engine::{FsConfig, MulticloudFs};
use stratus_metadata::{MemoryMetadataStore, MetadataStore};
use stratus_provider::{
    MemoryProvider, ProviderClient, ProviderDescriptor, ProviderKind, ProviderRegistry,
};

pub const NAMESPACE: &str = "test-user";

pub struct Harness {
    pub metadata: Arc<MemoryMetadataStore>,
    pub providers: Vec<Arc<MemoryProvider>>,
    pub fs: MulticloudFs,
}

impl Harness {
    pub fn new(provider_count: usize, config: FsConfig) -> Self {
        init_tracing();

        let metadata = Arc::new(MemoryMetadataStore::new());

        // The pool goes through descriptor -> registry -> client like a
        // real deployment; the factory keeps a concrete handle per client
        // so tests can reach the counters and failure switches.
        let handles: Arc<Mutex<Vec<Arc<MemoryProvider>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = handles.clone();
        let mut registry = ProviderRegistry::empty();
        registry.register(
            ProviderKind::Memory,
            Box::new(move |descriptor| {
                let provider = Arc::new(MemoryProvider::with_id(
                    descriptor.provider_id(),
                    descriptor.name.clone(),
                ));
                sink.lock().push(provider.clone());
                Ok(provider as Arc<dyn ProviderClient>)
            }),
        );

        let descriptors: Vec<ProviderDescriptor> = (0..provider_count)
            .map(|i| ProviderDescriptor::new(ProviderKind::Memory, format!("mem-{i}")))
            .collect();
        let pool = registry.build_pool(&descriptors).expect("pool builds");
        let providers = std::mem::take(&mut *handles.lock());

        let fs = MulticloudFs::new(
            NAMESPACE,
            metadata.clone() as Arc<dyn MetadataStore>,
            pool,
            config,
        )
        .expect("valid test config");

        Self {
            metadata,
            providers,
            fs,
        }
    }

    /// Upload attempts across the whole pool
    pub fn total_uploads(&self) -> u64 {
        self.providers.iter().map(|p| p.upload_count()).sum()
    }

    /// Objects currently stored across the whole pool
    pub fn total_objects(&self) -> usize {
        self.providers.iter().map(|p| p.object_count()).sum()
    }

    pub fn provider_by_id(&self, id: ProviderId) -> &Arc<MemoryProvider> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .expect("provider in pool")
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
