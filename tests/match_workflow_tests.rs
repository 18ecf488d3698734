use std::sync::Arc;
use std::time::Duration;

use straight_pool::{
    game::{MatchPhase, TurnAction, FULL_RACK},
    persistence::{load_snapshot, InMemoryKeyValueStore, MatchRepository, SNAPSHOT_KEY},
    PlayerAction, RuleSet,
};

mod utils;

use utils::*;

use straight_pool::PlayerNumber::{One, Two};

#[tokio::test]
async fn test_full_match_with_handicap_is_submitted_on_win() {
    let setup = TestSetupBuilder::new().build().await;
    setup.start(0, 10, 30).await; // Alice is spotted 10

    assert_eq!(setup.score(One).await, 10);

    setup
        .play_all(&[
            (One, PlayerAction::Points { amount: 12 }),
            (One, PlayerAction::FinishRack),
            (One, PlayerAction::Miss),
            (Two, PlayerAction::Points { amount: 5 }),
            (Two, PlayerAction::Foul),
        ])
        .await;
    let outcome = setup.play(One, PlayerAction::Points { amount: 6 }).await;

    assert_eq!(outcome.report.unwrap().winner, Some(One));
    assert_eq!(outcome.view.state.phase, MatchPhase::Finished);
    assert_eq!(outcome.view.players[0].score, 30);
    assert_eq!(outcome.view.players[1].score, 4);

    let matches = setup.repository.list_matches().await.unwrap();
    assert_eq!(matches.len(), 1);
    let record = &matches[0];
    assert_eq!(record.winner, One);
    assert_eq!(record.winner_name, "Alice");
    assert_eq!(record.target_score, 30);
    assert_eq!(record.turns.len(), 7);
    assert_eq!(record.turns[0].action_label, "Handicap Applied");
    assert_eq!(record.player1.record.break_and_runs, 1);
    assert_eq!(record.player1.stats.best_run, 14);
    assert_eq!(record.player1.record.best_run, 14);
    assert!(record.turns[5].is_foul);

    // Nothing moves once the match is over
    let after = setup.service.apply(Two, PlayerAction::Miss).await;
    assert!(!after.applied);
    let undo = setup.service.apply(One, PlayerAction::Undo).await;
    assert!(!undo.applied);
}

#[tokio::test]
async fn test_three_consecutive_fouls_and_single_step_undo() {
    let setup = TestSetupBuilder::new().build().await;
    setup.start(0, 0, 125).await;

    setup
        .play_all(&[
            (One, PlayerAction::Foul),
            (Two, PlayerAction::Miss),
            (One, PlayerAction::Foul),
            (Two, PlayerAction::Miss),
        ])
        .await;
    let warned = setup.service.view().await;
    assert_eq!(warned.consecutive_fouls, [2, 0]);
    assert!(warned.foul_warning[0]);

    let outcome = setup.play(One, PlayerAction::Foul).await;
    assert!(outcome.report.unwrap().three_foul_penalty);
    assert_eq!(outcome.view.players[0].score, -18);
    assert_eq!(outcome.view.consecutive_fouls, [0, 0]);
    assert_eq!(
        outcome.view.ledger.last().map(|turn| turn.action),
        Some(TurnAction::ThreeFoulPenalty)
    );

    let undone = setup.play(Two, PlayerAction::Undo).await;
    assert_eq!(undone.view.players[0].score, -2);
    assert_eq!(undone.view.consecutive_fouls, [2, 0]);
    assert_eq!(undone.view.state.active_player, One);
    assert_eq!(
        undone.view.ledger.last().map(|turn| turn.action),
        Some(TurnAction::Miss)
    );
}

#[tokio::test]
async fn test_clean_turn_breaks_foul_streak_when_enabled() {
    let rules = RuleSet {
        clean_turn_resets_foul_streak: true,
        ..RuleSet::default()
    };
    let setup = TestSetupBuilder::new().with_rules(rules).build().await;
    setup.start(0, 0, 125).await;

    let view = setup
        .play_all(&[
            (One, PlayerAction::Foul),
            (Two, PlayerAction::Miss),
            (One, PlayerAction::Safety),
            (Two, PlayerAction::Miss),
            (One, PlayerAction::Foul),
            (Two, PlayerAction::Miss),
            (One, PlayerAction::Foul),
        ])
        .await;

    assert_eq!(view.players[0].score, -3);
    assert!(view
        .ledger
        .iter()
        .all(|turn| turn.action != TurnAction::ThreeFoulPenalty));
    assert_eq!(view.consecutive_fouls, [2, 0]);
}

#[tokio::test]
async fn test_breaking_foul_choices() {
    let setup = TestSetupBuilder::new().build().await;
    setup.start(0, 0, 125).await;

    let pending = setup.play(One, PlayerAction::BreakingFoul).await;
    assert!(pending.report.unwrap().awaiting_breaking_foul_choice);
    assert_eq!(pending.view.state.pending_breaking_foul, Some(One));
    assert!(pending.view.ledger.is_empty());

    let blocked = setup.service.apply(One, PlayerAction::Points { amount: 3 }).await;
    assert!(!blocked.applied);

    let rebreak = setup.play(One, PlayerAction::Rebreak).await;
    assert_eq!(rebreak.view.players[0].score, -2);
    assert_eq!(rebreak.view.state.active_player, One);
    assert!(rebreak.view.state.is_break_shot);
    assert_eq!(rebreak.view.state.object_balls_on_table, FULL_RACK);

    setup.play(One, PlayerAction::BreakingFoul).await;
    let continued = setup.play(Two, PlayerAction::ContinueAfterBreakingFoul).await;
    assert_eq!(continued.view.players[0].score, -4);
    assert_eq!(continued.view.players[0].breaking_fouls, 2);
    assert_eq!(continued.view.state.active_player, Two);
    assert!(continued.report.unwrap().foul_warning);
}

#[tokio::test]
async fn test_undo_withdraws_pending_breaking_foul() {
    let setup = TestSetupBuilder::new().build().await;
    setup.start(0, 0, 125).await;

    setup.play(One, PlayerAction::BreakingFoul).await;
    let undone = setup.play(One, PlayerAction::Undo).await;

    assert_eq!(undone.view.state.pending_breaking_foul, None);
    assert_eq!(undone.view.players[0].score, 0);
    assert!(!undone.view.can_undo);
}

#[tokio::test]
async fn test_rack_resets_when_one_ball_remains() {
    let setup = TestSetupBuilder::new().build().await;
    setup.start(0, 0, 125).await;

    let outcome = setup.play(One, PlayerAction::Points { amount: 14 }).await;

    assert!(outcome.report.unwrap().rack_reset);
    assert_eq!(outcome.view.state.object_balls_on_table, FULL_RACK);
    assert_eq!(outcome.view.state.active_player, One);
    assert_eq!(outcome.view.players[0].current_run, 14);
}

#[tokio::test]
async fn test_restart_resumes_from_snapshot() {
    let first = TestSetupBuilder::new().build().await;
    first.start(5, 0, 100).await;
    first
        .play_all(&[
            (One, PlayerAction::Points { amount: 7 }),
            (One, PlayerAction::Scratch),
            (Two, PlayerAction::Points { amount: 3 }),
            (Two, PlayerAction::Safety),
        ])
        .await;
    first.service.flush().await;
    let before = first.service.view().await;

    let second = TestSetupBuilder::new()
        .with_store(first.store.clone())
        .build()
        .await;
    let after = second.service.view().await;

    assert_eq!(after.state, before.state);
    assert_eq!(after.players, before.players);
    assert_eq!(after.ledger, before.ledger);
    assert_eq!(after.consecutive_fouls, [1, 0]);
    assert!(!after.can_undo);

    // Play carries on from the restored table
    let outcome = second.play(One, PlayerAction::Points { amount: 2 }).await;
    assert_eq!(outcome.view.players[0].score, before.players[0].score + 2);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_fresh() {
    let store = Arc::new(InMemoryKeyValueStore::with_entry(SNAPSHOT_KEY, "{not json"));
    let setup = TestSetupBuilder::new().with_store(store).build().await;

    let view = setup.service.view().await;
    assert_eq!(view.state.phase, MatchPhase::NotStarted);
    assert_eq!(view.state.object_balls_on_table, FULL_RACK);
    assert_eq!(view.state.target_goal, 125);
    assert_eq!(view.state.active_player, One);
    assert_eq!(view.state.current_inning, 1);
    assert!(view.ledger.is_empty());

    setup.start(0, 0, 50).await;
}

#[tokio::test]
async fn test_partially_readable_snapshot_keeps_good_fields() {
    let raw = r#"{
        "state": {"phase": "inProgress", "activePlayer": 2, "targetGoal": "lots"},
        "players": [{"name": "Carol", "score": 33}, {"name": "Dan", "score": 12}],
        "ledger": [{"bogus": true}]
    }"#;
    let store = Arc::new(InMemoryKeyValueStore::with_entry(SNAPSHOT_KEY, raw));
    let setup = TestSetupBuilder::new().with_store(store).build().await;

    let view = setup.service.view().await;
    assert_eq!(view.state.phase, MatchPhase::InProgress);
    assert_eq!(view.state.active_player, Two);
    assert_eq!(view.state.target_goal, 125);
    assert_eq!(view.players[0].name, "Carol");
    assert_eq!(view.players[0].score, 33);
    assert!(view.ledger.is_empty());

    let outcome = setup.play(Two, PlayerAction::Points { amount: 4 }).await;
    assert_eq!(outcome.view.players[1].score, 16);
}

#[tokio::test]
async fn test_burst_of_actions_is_saved_once() {
    let setup = TestSetupBuilder::new()
        .with_debounce(Duration::from_millis(50))
        .build()
        .await;

    setup.start(0, 0, 125).await;
    setup
        .play_all(&[
            (One, PlayerAction::Points { amount: 1 }),
            (One, PlayerAction::Points { amount: 2 }),
            (One, PlayerAction::Points { amount: 3 }),
            (One, PlayerAction::Miss),
        ])
        .await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(setup.store.write_count(), 1);
    let saved = load_snapshot(setup.store.as_ref()).await.unwrap();
    assert_eq!(saved.players[0].score, 6);
    assert_eq!(saved.state.active_player, Two);
}

#[tokio::test]
async fn test_reset_clears_snapshot_and_keeps_players() {
    let setup = TestSetupBuilder::new().build().await;
    setup.start(3, 0, 60).await;
    setup.play(One, PlayerAction::Points { amount: 5 }).await;
    setup.service.flush().await;
    assert!(setup.store.contains(SNAPSHOT_KEY));

    let view = setup.service.reset().await;
    setup.service.flush().await;

    assert_eq!(view.state.phase, MatchPhase::NotStarted);
    assert_eq!(view.state.target_goal, 60);
    assert_eq!(view.players[0].name, "Alice");
    assert_eq!(view.players[0].handicap, 3);
    assert_eq!(view.players[0].score, 0);
    assert!(view.ledger.is_empty());
    assert!(!setup.store.contains(SNAPSHOT_KEY));
}
