use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::game::RuleSet;
use crate::persistence::SaverConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration for the scorekeeper server
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    /// PostgreSQL connection string; finished matches stay in memory when unset
    pub database_url: Option<String>,
    /// Directory for the in-progress snapshot; kept in memory when unset
    pub snapshot_dir: Option<PathBuf>,
    pub saver: SaverConfig,
    pub rules: RuleSet,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            database_url: None,
            snapshot_dir: None,
            saver: SaverConfig::default(),
            rules: RuleSet::default(),
        }
    }
}

impl AppConfig {
    /// Build config from process environment variables.
    ///
    /// All optional:
    /// - `BIND_ADDRESS` (defaults to `0.0.0.0:3000`)
    /// - `DATABASE_URL`
    /// - `SNAPSHOT_DIR`
    /// - `SNAPSHOT_DEBOUNCE_MS` (defaults to 100)
    /// - `TARGET_GOAL` (defaults to 125)
    /// - `INTENTIONAL_FOUL_PENALTY` (defaults to 1)
    /// - `CLEAN_TURN_RESETS_FOUL_STREAK` (defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut rules = defaults.rules;
        if let Some(goal) = parsed::<i32>(&var, "TARGET_GOAL")? {
            if goal <= 0 {
                return Err(ConfigError::InvalidValue {
                    key: "TARGET_GOAL",
                    value: goal.to_string(),
                });
            }
            rules.default_target_goal = goal;
        }
        if let Some(penalty) = parsed::<i32>(&var, "INTENTIONAL_FOUL_PENALTY")? {
            rules.intentional_foul_penalty = penalty;
        }
        if let Some(resets) = parsed::<bool>(&var, "CLEAN_TURN_RESETS_FOUL_STREAK")? {
            rules.clean_turn_resets_foul_streak = resets;
        }

        let saver = match parsed::<u64>(&var, "SNAPSHOT_DEBOUNCE_MS")? {
            Some(ms) => SaverConfig {
                debounce: Duration::from_millis(ms),
            },
            None => defaults.saver,
        };

        Ok(Self {
            bind_address: var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            database_url: var("DATABASE_URL"),
            snapshot_dir: var("SNAPSHOT_DIR").map(PathBuf::from),
            saver,
            rules,
        })
    }
}

fn parsed<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}
