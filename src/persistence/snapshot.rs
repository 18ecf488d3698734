// A saved match is read back one field at a time. Anything missing or
// malformed falls back to its default on its own, so one bad value never
// discards the rest of the match.
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::game::{
    FoulStreak, MatchClock, MatchState, PlayerRecord, RuleSet, ScoringEngine, Turn, TurnLedger,
};

/// Storage key for the in-progress match
pub const SNAPSHOT_KEY: &str = "straightPoolGameState";

/// Everything needed to resume a match after a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMatch {
    pub state: MatchState,
    pub players: [PlayerRecord; 2],
    pub ledger: TurnLedger,
    pub foul_streaks: [FoulStreak; 2],
    pub clock: MatchClock,
}

impl PersistedMatch {
    pub fn capture(engine: &ScoringEngine) -> Self {
        Self {
            state: engine.state().clone(),
            players: engine.players().clone(),
            ledger: engine.ledger().clone(),
            foul_streaks: engine.foul_streaks().clone(),
            clock: engine.clock().clone(),
        }
    }

    pub fn into_engine(self, rules: RuleSet) -> ScoringEngine {
        ScoringEngine::from_parts(
            rules,
            self.players,
            self.state,
            self.foul_streaks,
            self.ledger,
            self.clock,
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a stored snapshot. Never fails: unreadable input yields a
    /// fresh match, unreadable fields yield their defaults.
    pub fn decode(raw: &str) -> Self {
        let root = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(root)) => root,
            Ok(_) => {
                warn!("Stored snapshot is not an object, starting fresh");
                return Self::default();
            }
            Err(e) => {
                warn!(error = %e, "Stored snapshot is not valid JSON, starting fresh");
                return Self::default();
            }
        };

        let mut decoded = Self {
            state: decode_state(root.get("state")),
            players: decode_pair(root.get("players"), "players"),
            ledger: decode_ledger(root.get("ledger")),
            foul_streaks: decode_pair(root.get("foulStreaks"), "foulStreaks"),
            clock: field(&root, "clock"),
        };
        decoded.state.normalize();
        decoded
            .foul_streaks
            .iter_mut()
            .for_each(FoulStreak::normalize);
        decoded.clock.normalize(Utc::now());
        decoded
    }
}

/// Reads the saved match from the store, if there is one
pub async fn load_snapshot(store: &dyn KeyValueStore) -> Option<PersistedMatch> {
    match store.get(SNAPSHOT_KEY).await {
        Ok(Some(raw)) => {
            debug!(bytes = raw.len(), "Loaded stored snapshot");
            Some(PersistedMatch::decode(&raw))
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Failed to read stored snapshot, starting fresh");
            None
        }
    }
}

fn field<T: DeserializeOwned + Default>(object: &Map<String, Value>, key: &str) -> T {
    match object.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(field = key, error = %e, "Malformed snapshot field, using default");
            T::default()
        }),
    }
}

fn decode_state(value: Option<&Value>) -> MatchState {
    let Some(Value::Object(object)) = value else {
        if value.is_some() {
            warn!("Malformed match state, using defaults");
        }
        return MatchState::default();
    };

    let defaults = MatchState::default();
    MatchState {
        phase: field(object, "phase"),
        active_player: field(object, "activePlayer"),
        current_inning: field_or(object, "currentInning", defaults.current_inning),
        object_balls_on_table: field_or(
            object,
            "objectBallsOnTable",
            defaults.object_balls_on_table,
        ),
        break_player: field(object, "breakPlayer"),
        is_break_shot: field(object, "isBreakShot"),
        target_goal: field_or(object, "targetGoal", defaults.target_goal),
        pending_breaking_foul: field(object, "pendingBreakingFoul"),
        winner: field(object, "winner"),
        rack_held_by: field(object, "rackHeldBy"),
    }
}

fn field_or<T: DeserializeOwned>(object: &Map<String, Value>, key: &str, default: T) -> T {
    match object.get(key) {
        None | Some(Value::Null) => default,
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(field = key, error = %e, "Malformed snapshot field, using default");
            default
        }),
    }
}

fn decode_pair<T: DeserializeOwned + Default>(value: Option<&Value>, key: &str) -> [T; 2] {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Default::default(),
        Some(_) => {
            warn!(field = key, "Malformed snapshot field, using default");
            return Default::default();
        }
    };

    let decode_at = |index: usize| -> T {
        items
            .get(index)
            .and_then(|item| match serde_json::from_value(item.clone()) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(field = key, index, error = %e, "Malformed snapshot entry, using default");
                    None
                }
            })
            .unwrap_or_default()
    };
    [decode_at(0), decode_at(1)]
}

/// Keeps every readable entry and drops the rest
fn decode_ledger(value: Option<&Value>) -> TurnLedger {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return TurnLedger::new(),
        Some(_) => {
            warn!("Malformed ledger, starting with an empty history");
            return TurnLedger::new();
        }
    };

    let mut dropped = 0usize;
    let entries: Vec<Turn> = items
        .iter()
        .filter_map(|item| {
            serde_json::from_value(item.clone())
                .map_err(|_| dropped += 1)
                .ok()
        })
        .collect();

    if dropped > 0 {
        warn!(dropped, kept = entries.len(), "Dropped unreadable ledger entries");
    }
    TurnLedger::from_entries(entries)
}
