use straight_pool::{
    game::{ActionOutcome, MatchView},
    PlayerAction, PlayerNumber, PlayerSeed,
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Start a match between Alice and Bob
    pub async fn start(&self, alice_handicap: i32, bob_handicap: i32, target_goal: i32) {
        let outcome = self
            .service
            .start_game(
                PlayerSeed::new("Alice", alice_handicap),
                PlayerSeed::new("Bob", bob_handicap),
                Some(target_goal),
            )
            .await
            .unwrap();
        assert!(outcome.applied, "match did not start: {:?}", outcome.rejected);
    }

    /// Apply an action that is expected to succeed
    pub async fn play(&self, player: PlayerNumber, action: PlayerAction) -> ActionOutcome {
        let outcome = self.service.apply(player, action).await;
        assert!(
            outcome.applied,
            "{:?} by player {} was rejected: {:?}",
            action, player, outcome.rejected
        );
        outcome
    }

    /// Apply a sequence of actions that are all expected to succeed
    pub async fn play_all(&self, script: &[(PlayerNumber, PlayerAction)]) -> MatchView {
        for (player, action) in script {
            self.play(*player, *action).await;
        }
        self.service.view().await
    }

    pub async fn score(&self, player: PlayerNumber) -> i32 {
        self.service.view().await.players[player.index()].score
    }
}
