use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::record::MatchRecord;
use super::PersistenceError;

/// Trait for finished-match storage
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn submit_match(&self, record: &MatchRecord) -> Result<(), PersistenceError>;
    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, PersistenceError>;
    /// Most recently completed first
    async fn list_matches(&self) -> Result<Vec<MatchRecord>, PersistenceError>;
}

/// In-memory implementation of MatchRepository for development and testing
///
/// Data is lost when the application restarts.
pub struct InMemoryMatchRepository {
    matches: Mutex<HashMap<Uuid, MatchRecord>>,
}

impl Default for InMemoryMatchRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self {
            matches: Mutex::new(HashMap::new()),
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.lock().unwrap().len()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    #[instrument(skip(self, record), fields(match_id = %record.match_id))]
    async fn submit_match(&self, record: &MatchRecord) -> Result<(), PersistenceError> {
        debug!(winner = %record.winner_name, "Storing match in memory");

        let mut matches = self.matches.lock().unwrap();
        if matches.contains_key(&record.match_id) {
            warn!("Match already exists in memory");
            return Err(PersistenceError::Database(
                "Match already exists".to_string(),
            ));
        }
        matches.insert(record.match_id, record.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, PersistenceError> {
        let matches = self.matches.lock().unwrap();
        let record = matches.get(&match_id).cloned();
        if record.is_none() {
            debug!(match_id = %match_id, "Match not found in memory");
        }
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn list_matches(&self) -> Result<Vec<MatchRecord>, PersistenceError> {
        let matches = self.matches.lock().unwrap();
        let mut records: Vec<MatchRecord> = matches.values().cloned().collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(records)
    }
}

/// PostgreSQL implementation of match repository.
///
/// The full record is kept as a JSON payload next to a few columns for
/// listing and ordering.
pub struct PostgresMatchRepository {
    pool: PgPool,
}

impl PostgresMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the matches table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS straight_pool_matches (
                id UUID PRIMARY KEY,
                player1_name TEXT NOT NULL,
                player2_name TEXT NOT NULL,
                winner_name TEXT NOT NULL,
                target_score INTEGER NOT NULL,
                duration_seconds BIGINT NOT NULL,
                completed_at TIMESTAMPTZ NOT NULL,
                payload TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create matches table");
            PersistenceError::Database(e.to_string())
        })?;
        Ok(())
    }

    fn decode_row(row: &sqlx::postgres::PgRow) -> Result<MatchRecord, PersistenceError> {
        let payload: String = row.try_get("payload")?;
        Ok(serde_json::from_str(&payload)?)
    }
}

#[async_trait]
impl MatchRepository for PostgresMatchRepository {
    #[instrument(skip(self, record), fields(match_id = %record.match_id))]
    async fn submit_match(&self, record: &MatchRecord) -> Result<(), PersistenceError> {
        debug!(winner = %record.winner_name, "Storing match in database");
        let payload = serde_json::to_string(record)?;

        sqlx::query(
            "INSERT INTO straight_pool_matches (id, player1_name, player2_name, winner_name, target_score, duration_seconds, completed_at, payload) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        )
        .bind(record.match_id)
        .bind(&record.player1.name)
        .bind(&record.player2.name)
        .bind(&record.winner_name)
        .bind(record.target_score)
        .bind(record.duration_seconds)
        .bind(record.completed_at)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to store match in database");
            PersistenceError::Database(e.to_string())
        })?;

        debug!("Match stored successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, PersistenceError> {
        let row = sqlx::query("SELECT payload FROM straight_pool_matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, match_id = %match_id, "Failed to fetch match from database");
                PersistenceError::Database(e.to_string())
            })?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_matches(&self) -> Result<Vec<MatchRecord>, PersistenceError> {
        let rows = sqlx::query("SELECT payload FROM straight_pool_matches ORDER BY completed_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list matches from database");
                PersistenceError::Database(e.to_string())
            })?;

        let records = rows
            .iter()
            .map(Self::decode_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "Matches listed from database");
        Ok(records)
    }
}
