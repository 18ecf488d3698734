use serde::{Deserialize, Serialize};

use super::state::DEFAULT_TARGET_GOAL;

/// Penalty values and streak policy applied by the scoring engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    pub default_target_goal: i32,
    pub foul_penalty: i32,
    pub scratch_penalty: i32,
    pub intentional_foul_penalty: i32,
    pub breaking_foul_penalty: i32,
    pub three_foul_penalty: i32,
    /// When set, a safety, miss or manual pass breaks the consecutive foul count
    pub clean_turn_resets_foul_streak: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            default_target_goal: DEFAULT_TARGET_GOAL,
            foul_penalty: 1,
            scratch_penalty: 1,
            intentional_foul_penalty: 1,
            breaking_foul_penalty: 2,
            three_foul_penalty: 15,
            clean_turn_resets_foul_streak: false,
        }
    }
}
