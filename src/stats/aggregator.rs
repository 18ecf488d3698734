// Read-side projections over the turn ledger. Nothing here looks at live
// engine state: the ledger is the only input, so the same numbers come out
// for a live match, a restored one, or a submitted record.
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

use super::models::{ActionMark, PlayerMatchStats, TurnGroup};
use crate::game::{PlayerNumber, Turn, TurnAction};

pub fn player_stats(ledger: &[Turn], player: PlayerNumber) -> PlayerMatchStats {
    let total_score = final_score(ledger, player);
    let total_innings = innings_played(ledger, player);
    let avg_points_per_inning = if total_innings == 0 {
        0.0
    } else {
        f64::from(total_score) / f64::from(total_innings)
    };

    let mut stats = PlayerMatchStats {
        player_number: player,
        best_run: best_run(ledger, player),
        total_score,
        total_innings,
        avg_points_per_inning,
        action_counts: TurnAction::iter().map(|action| (action, 0)).collect(),
        safeties: Vec::new(),
        misses: Vec::new(),
        scratches: Vec::new(),
        fouls: Vec::new(),
        intentional_fouls: Vec::new(),
        breaking_fouls: Vec::new(),
        finished_racks: Vec::new(),
        turn_groups: turn_groups(ledger, player),
    };

    for turn in ledger.iter().filter(|turn| turn.player_number == player) {
        *stats.action_counts.entry(turn.action).or_default() += 1;

        let mark = ActionMark {
            inning: turn.inning,
            points: turn.points,
        };
        match turn.action {
            TurnAction::Safety => stats.safeties.push(mark),
            TurnAction::Miss => stats.misses.push(mark),
            TurnAction::Scratch => stats.scratches.push(mark),
            TurnAction::Foul => stats.fouls.push(mark),
            TurnAction::IntentionalFoul => stats.intentional_fouls.push(mark),
            TurnAction::BreakingFoul | TurnAction::BreakingFoulRebreak => {
                stats.breaking_fouls.push(mark)
            }
            TurnAction::FinishRack => stats.finished_racks.push(mark),
            TurnAction::Points
            | TurnAction::ThreeFoulPenalty
            | TurnAction::HandicapApplied
            | TurnAction::TurnPassed => {}
        }
    }

    stats
}

/// Longest run rebuilt from the ledger.
///
/// A run grows on scoring shots and resets on any terminal action by the
/// player or whenever the opponent is at the table.
pub fn best_run(ledger: &[Turn], player: PlayerNumber) -> u32 {
    let mut current: u32 = 0;
    let mut best: u32 = 0;

    for turn in ledger {
        if turn.action.is_bookkeeping() {
            continue;
        }
        if turn.player_number != player {
            current = 0;
            continue;
        }
        if turn.is_scoring_shot() {
            current = current.saturating_add(turn.points.max(0) as u32);
            best = best.max(current);
        } else if turn.breaks_run() {
            current = 0;
        }
    }

    best
}

/// Distinct innings in which the player took a shot
pub fn innings_played(ledger: &[Turn], player: PlayerNumber) -> u32 {
    ledger
        .iter()
        .filter(|turn| turn.player_number == player && !turn.action.is_bookkeeping())
        .map(|turn| turn.inning)
        .collect::<BTreeSet<_>>()
        .len() as u32
}

/// Score after the player's most recent entry
pub fn final_score(ledger: &[Turn], player: PlayerNumber) -> i32 {
    ledger
        .iter()
        .rev()
        .find(|turn| turn.player_number == player)
        .map(|turn| turn.score_after)
        .unwrap_or_default()
}

/// Groups the player's scoring shots into visits. A new group starts whenever
/// the player's previous entry was not a scoring shot.
pub fn turn_groups(ledger: &[Turn], player: PlayerNumber) -> Vec<TurnGroup> {
    let mut groups: Vec<TurnGroup> = Vec::new();
    let mut previous_was_scoring = false;

    for turn in ledger
        .iter()
        .filter(|turn| turn.player_number == player && !turn.action.is_bookkeeping())
    {
        if !turn.is_scoring_shot() {
            previous_was_scoring = false;
            continue;
        }

        match groups.last_mut() {
            Some(group) if previous_was_scoring => {
                group.points = group.points.saturating_add(turn.points);
                group.shots.push(turn.clone());
            }
            _ => groups.push(TurnGroup {
                inning: turn.inning,
                points: turn.points,
                shots: vec![turn.clone()],
            }),
        }
        previous_was_scoring = true;
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerAction, PlayerSeed, ScoringEngine};
    use chrono::Utc;

    use crate::game::PlayerNumber::{One, Two};

    fn entry(inning: u32, player: PlayerNumber, action: TurnAction, points: i32, score_after: i32) -> Turn {
        Turn {
            inning,
            player_number: player,
            player_name: format!("Player {}", player),
            action,
            points,
            timestamp: Utc::now(),
            score_after,
        }
    }

    fn played(script: &[(PlayerNumber, PlayerAction)]) -> ScoringEngine {
        let mut engine = ScoringEngine::default();
        engine
            .start_game(PlayerSeed::new("Alice", 0), PlayerSeed::new("Bob", 3), 1000)
            .unwrap();
        for (player, action) in script {
            engine.apply(*player, *action).unwrap();
        }
        engine
    }

    #[test]
    fn best_run_spans_consecutive_scoring_entries() {
        let ledger = vec![
            entry(1, One, TurnAction::Points, 4, 4),
            entry(1, One, TurnAction::FinishRack, 10, 14),
            entry(1, One, TurnAction::Points, 2, 16),
            entry(1, One, TurnAction::Miss, 0, 16),
            entry(1, Two, TurnAction::Points, 30, 30),
            entry(1, Two, TurnAction::Safety, 0, 30),
            entry(2, One, TurnAction::Points, 5, 21),
        ];

        assert_eq!(best_run(&ledger, One), 16);
        assert_eq!(best_run(&ledger, Two), 30);
    }

    #[test]
    fn zero_point_entries_and_opponent_turns_end_runs() {
        let ledger = vec![
            entry(1, One, TurnAction::Points, 6, 6),
            entry(1, One, TurnAction::Points, 0, 6),
            entry(1, Two, TurnAction::Foul, -1, -1),
            entry(2, One, TurnAction::Points, 3, 9),
            entry(2, One, TurnAction::TurnPassed, 0, 9),
            entry(2, Two, TurnAction::Points, 1, 0),
            entry(2, Two, TurnAction::Miss, 0, 0),
            entry(3, One, TurnAction::Points, 4, 13),
        ];

        assert_eq!(best_run(&ledger, One), 6);
    }

    #[test]
    fn projection_matches_engine_best_run() {
        let engine = played(&[
            (One, PlayerAction::Points { amount: 5 }),
            (One, PlayerAction::FinishRack),
            (One, PlayerAction::Points { amount: 3 }),
            (One, PlayerAction::Foul),
            (Two, PlayerAction::Points { amount: 8 }),
            (Two, PlayerAction::SwitchTurn),
            (One, PlayerAction::Points { amount: 2 }),
            (One, PlayerAction::Safety),
            (Two, PlayerAction::Points { amount: 6 }),
            (Two, PlayerAction::FinishRack),
            (Two, PlayerAction::Miss),
        ]);

        for player in PlayerNumber::BOTH {
            assert_eq!(
                best_run(engine.ledger().entries(), player),
                engine.player(player).best_run,
                "player {}",
                player
            );
        }
    }

    #[test]
    fn innings_count_distinct_innings_without_handicap() {
        let engine = played(&[
            (One, PlayerAction::Miss),
            (Two, PlayerAction::Points { amount: 2 }),
            (Two, PlayerAction::Miss),
            (One, PlayerAction::Safety),
            (Two, PlayerAction::Safety),
        ]);
        let ledger = engine.ledger().entries();

        assert_eq!(ledger[0].action, TurnAction::HandicapApplied);
        assert_eq!(innings_played(ledger, One), 2);
        assert_eq!(innings_played(ledger, Two), 2);
    }

    #[test]
    fn average_uses_final_score_over_innings() {
        let ledger = vec![
            entry(1, One, TurnAction::Points, 9, 9),
            entry(1, One, TurnAction::Miss, 0, 9),
            entry(2, One, TurnAction::Points, 3, 12),
            entry(2, One, TurnAction::Safety, 0, 12),
        ];

        let stats = player_stats(&ledger, One);
        assert_eq!(stats.total_score, 12);
        assert_eq!(stats.total_innings, 2);
        assert!((stats.avg_points_per_inning - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_ledger_has_zero_average() {
        let stats = player_stats(&[], Two);
        assert_eq!(stats.total_innings, 0);
        assert_eq!(stats.avg_points_per_inning, 0.0);
        assert_eq!(stats.best_run, 0);
        assert!(stats.turn_groups.is_empty());
        assert_eq!(stats.count(TurnAction::Foul), 0);
    }

    #[test]
    fn marks_and_counts_are_partitioned_by_action() {
        let engine = played(&[
            (One, PlayerAction::Foul),
            (Two, PlayerAction::Scratch),
            (One, PlayerAction::IntentionalFoul),
            (Two, PlayerAction::Safety),
            (One, PlayerAction::FinishRack),
            (One, PlayerAction::Miss),
            (Two, PlayerAction::BreakingFoul),
            (Two, PlayerAction::Rebreak),
            (Two, PlayerAction::Miss),
        ]);
        let ledger = engine.ledger().entries();

        let alice = player_stats(ledger, One);
        assert_eq!(alice.fouls, vec![ActionMark { inning: 1, points: -1 }]);
        assert_eq!(alice.intentional_fouls.len(), 1);
        assert_eq!(alice.finished_racks, vec![ActionMark { inning: 3, points: 14 }]);
        assert_eq!(alice.misses.len(), 1);
        assert_eq!(alice.count(TurnAction::FinishRack), 1);
        assert_eq!(alice.count(TurnAction::HandicapApplied), 1);

        let bob = player_stats(ledger, Two);
        assert_eq!(bob.scratches.len(), 1);
        assert_eq!(bob.safeties, vec![ActionMark { inning: 2, points: 0 }]);
        assert_eq!(bob.breaking_fouls, vec![ActionMark { inning: 3, points: -2 }]);
        assert_eq!(bob.count(TurnAction::HandicapApplied), 0);
    }

    #[test]
    fn turn_groups_split_on_non_scoring_entries() {
        let ledger = vec![
            entry(1, One, TurnAction::Points, 2, 2),
            entry(1, One, TurnAction::Points, 3, 5),
            entry(1, One, TurnAction::Miss, 0, 5),
            entry(1, Two, TurnAction::Points, 1, 1),
            entry(1, Two, TurnAction::Safety, 0, 1),
            entry(2, One, TurnAction::FinishRack, 14, 19),
            entry(2, One, TurnAction::Points, 1, 20),
        ];

        let groups = turn_groups(&ledger, One);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].points, 5);
        assert_eq!(groups[0].shots.len(), 2);
        assert_eq!(groups[1].inning, 2);
        assert_eq!(groups[1].points, 15);
    }

    #[test]
    fn restored_runs_with_huge_points_saturate() {
        let ledger = vec![
            entry(1, One, TurnAction::Points, i32::MAX, i32::MAX),
            entry(1, One, TurnAction::Points, i32::MAX, i32::MAX),
            entry(1, One, TurnAction::Points, i32::MAX, i32::MAX),
        ];

        assert_eq!(best_run(&ledger, One), u32::MAX);
        assert_eq!(turn_groups(&ledger, One)[0].points, i32::MAX);
    }
}
