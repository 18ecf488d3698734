use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two seats at the table.
///
/// Serialized as `1` or `2` so persisted snapshots and API payloads stay
/// readable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerNumber {
    #[default]
    One,
    Two,
}

impl PlayerNumber {
    pub const BOTH: [PlayerNumber; 2] = [PlayerNumber::One, PlayerNumber::Two];

    pub fn opponent(self) -> Self {
        match self {
            PlayerNumber::One => PlayerNumber::Two,
            PlayerNumber::Two => PlayerNumber::One,
        }
    }

    /// Index into per-player arrays
    pub fn index(self) -> usize {
        match self {
            PlayerNumber::One => 0,
            PlayerNumber::Two => 1,
        }
    }
}

impl fmt::Display for PlayerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl TryFrom<u8> for PlayerNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlayerNumber::One),
            2 => Ok(PlayerNumber::Two),
            other => Err(format!("invalid player number: {}", other)),
        }
    }
}

impl From<PlayerNumber> for u8 {
    fn from(player: PlayerNumber) -> Self {
        match player {
            PlayerNumber::One => 1,
            PlayerNumber::Two => 2,
        }
    }
}

/// Name and handicap a player brings to the table at game start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeed {
    pub name: String,
    #[serde(default)]
    pub handicap: i32,
}

impl PlayerSeed {
    pub fn new(name: impl Into<String>, handicap: i32) -> Self {
        Self {
            name: name.into(),
            handicap,
        }
    }
}

/// Cumulative stats and live state for one player.
///
/// Mutated only through the scoring engine. `name` and `handicap` are identity
/// and are never captured by undo snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,
    pub handicap: i32,
    pub score: i32,
    pub current_run: u32,
    pub best_run: u32,
    pub total_points: u32,
    pub total_innings: u32,
    pub safes: u32,
    pub misses: u32,
    pub scratches: u32,
    pub fouls: u32,
    pub intentional_fouls: u32,
    pub breaking_fouls: u32,
    pub break_and_runs: u32,
    pub defensive_shots: u32,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>, handicap: i32) -> Self {
        Self {
            name: name.into(),
            handicap,
            ..Self::default()
        }
    }

    pub fn from_seed(seed: &PlayerSeed) -> Self {
        Self::new(seed.name.clone(), seed.handicap)
    }

    /// Credits points from a scoring shot and extends the current run
    pub fn score_points(&mut self, points: u32) {
        self.score = self.score.saturating_add_unsigned(points);
        self.total_points = self.total_points.saturating_add(points);
        self.current_run = self.current_run.saturating_add(points);
        self.best_run = self.best_run.max(self.current_run);
    }

    /// Applies a signed score change that is not part of a run
    pub fn adjust(&mut self, delta: i32) {
        self.score = self.score.saturating_add(delta);
    }

    pub fn end_run(&mut self) {
        self.current_run = 0;
    }

    /// Restores every live field from `snapshot`, keeping this record's identity
    pub fn restore_from(&mut self, snapshot: &PlayerRecord) {
        let name = std::mem::take(&mut self.name);
        let handicap = self.handicap;
        *self = snapshot.clone();
        self.name = name;
        self.handicap = handicap;
    }
}
