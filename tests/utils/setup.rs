use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use straight_pool::{
    persistence::{
        load_snapshot, InMemoryKeyValueStore, InMemoryMatchRepository, SaverConfig,
        SnapshotSaver,
    },
    MatchService, RuleSet,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: Arc<MatchService>,
    pub store: Arc<InMemoryKeyValueStore>,
    pub repository: Arc<InMemoryMatchRepository>,
    pub _saver_handle: JoinHandle<()>,
}

pub struct TestSetupBuilder {
    rules: RuleSet,
    debounce: Duration,
    store: Option<Arc<InMemoryKeyValueStore>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            rules: RuleSet::default(),
            // Long enough that only an explicit flush writes
            debounce: Duration::from_secs(60),
            store: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Restores from an existing store, as a restarted server would
    pub fn with_store(mut self, store: Arc<InMemoryKeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn build(self) -> TestSetup {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryKeyValueStore::new()));
        let repository = Arc::new(InMemoryMatchRepository::new());

        let snapshot = load_snapshot(store.as_ref()).await;
        let (saver, saver_handle) = SnapshotSaver::spawn(
            store.clone(),
            SaverConfig {
                debounce: self.debounce,
            },
        );
        let service = Arc::new(MatchService::restore(
            self.rules,
            snapshot,
            saver,
            repository.clone(),
        ));

        TestSetup {
            service,
            store,
            repository,
            _saver_handle: saver_handle,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
