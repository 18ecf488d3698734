// Public API
pub use errors::PersistenceError;
pub use record::{MatchRecord, PlayerSummary, ProcessedTurn};
pub use repository::{InMemoryMatchRepository, MatchRepository, PostgresMatchRepository};
pub use saver::{SaverConfig, SnapshotSaver};
pub use snapshot::{load_snapshot, PersistedMatch, SNAPSHOT_KEY};
pub use store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};

// Internal modules
mod errors;
mod record;
mod repository;
mod saver;
mod snapshot;
mod store;
