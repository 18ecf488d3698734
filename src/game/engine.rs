// The scoring engine owns every piece of per-match state. Each public
// operation is a synchronous transition: it validates, pushes an undo
// snapshot, mutates, appends to the ledger and reports what happened.
//
// Win detection runs before any turn switch within the same action.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    clock::MatchClock,
    fouls::FoulStreak,
    ledger::{Turn, TurnAction, TurnLedger},
    player::{PlayerNumber, PlayerRecord, PlayerSeed},
    rules::RuleSet,
    state::{MatchPhase, MatchState, FULL_RACK},
    undo::{UndoSnapshot, UndoStack},
};

/// Why an action was not applied. No state changes when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionRejected {
    #[error("Game has not started")]
    NotStarted,
    #[error("Game already in progress")]
    AlreadyStarted,
    #[error("Game is finished")]
    GameFinished,
    #[error("Player {0} is not the active player")]
    NotActivePlayer(PlayerNumber),
    #[error("Player {0} must choose between continuing and a rebreak")]
    BreakingFoulPending(PlayerNumber),
    #[error("No breaking foul is awaiting a decision")]
    NoBreakingFoulPending,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Invalid target goal: {0}")]
    InvalidTargetGoal(i32),
    #[error("Invalid point amount: {0}")]
    InvalidAmount(i32),
}

/// What an applied action did besides the score change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReport {
    pub turn_passed: bool,
    pub rack_reset: bool,
    pub three_foul_penalty: bool,
    /// One more foul by the same player incurs the three-foul penalty
    pub foul_warning: bool,
    pub awaiting_breaking_foul_choice: bool,
    pub winner: Option<PlayerNumber>,
}

/// Player-initiated actions accepted by [`ScoringEngine::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerAction {
    Points { amount: i32 },
    FinishRack,
    Foul,
    Scratch,
    IntentionalFoul,
    Safety,
    Miss,
    BreakingFoul,
    ContinueAfterBreakingFoul,
    Rebreak,
    SwitchTurn,
    Undo,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    rules: RuleSet,
    players: [PlayerRecord; 2],
    state: MatchState,
    foul_streaks: [FoulStreak; 2],
    ledger: TurnLedger,
    undo: UndoStack,
    clock: MatchClock,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl ScoringEngine {
    pub fn new(rules: RuleSet) -> Self {
        let state = MatchState {
            target_goal: rules.default_target_goal,
            ..MatchState::default()
        };
        Self {
            rules,
            players: [
                PlayerRecord::new("Player 1", 0),
                PlayerRecord::new("Player 2", 0),
            ],
            state,
            foul_streaks: Default::default(),
            ledger: TurnLedger::new(),
            undo: UndoStack::new(),
            clock: MatchClock::new(),
        }
    }

    /// Rebuilds an engine from previously saved parts. The undo history is not
    /// part of a saved match and starts empty.
    pub fn from_parts(
        rules: RuleSet,
        players: [PlayerRecord; 2],
        mut state: MatchState,
        mut foul_streaks: [FoulStreak; 2],
        ledger: TurnLedger,
        mut clock: MatchClock,
    ) -> Self {
        state.normalize();
        foul_streaks.iter_mut().for_each(FoulStreak::normalize);
        clock.normalize(Utc::now());
        Self {
            rules,
            players,
            state,
            foul_streaks,
            ledger,
            undo: UndoStack::new(),
            clock,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn player(&self, player: PlayerNumber) -> &PlayerRecord {
        &self.players[player.index()]
    }

    pub fn players(&self) -> &[PlayerRecord; 2] {
        &self.players
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn ledger(&self) -> &TurnLedger {
        &self.ledger
    }

    pub fn foul_streak(&self, player: PlayerNumber) -> &FoulStreak {
        &self.foul_streaks[player.index()]
    }

    pub fn foul_streaks(&self) -> &[FoulStreak; 2] {
        &self.foul_streaks
    }

    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.clock.elapsed(now)
    }

    // ------------------------------------------------------------------
    // Pre-game setup
    // ------------------------------------------------------------------

    pub fn set_player_name(
        &mut self,
        player: PlayerNumber,
        name: impl Into<String>,
    ) -> Result<(), ActionRejected> {
        self.ensure_not_started()?;
        self.players[player.index()].name = name.into();
        Ok(())
    }

    pub fn set_handicap(&mut self, player: PlayerNumber, handicap: i32) -> Result<(), ActionRejected> {
        self.ensure_not_started()?;
        self.players[player.index()].handicap = handicap;
        Ok(())
    }

    pub fn set_target_goal(&mut self, target_goal: i32) -> Result<(), ActionRejected> {
        self.ensure_not_started()?;
        if target_goal <= 0 {
            return Err(ActionRejected::InvalidTargetGoal(target_goal));
        }
        self.state.target_goal = target_goal;
        Ok(())
    }

    /// Starts a match. The trailing player by handicap is spotted the
    /// difference so both face the same distance to the target.
    pub fn start_game(
        &mut self,
        player1: PlayerSeed,
        player2: PlayerSeed,
        target_goal: i32,
    ) -> Result<ActionReport, ActionRejected> {
        self.ensure_not_started()?;
        if target_goal <= 0 {
            return Err(ActionRejected::InvalidTargetGoal(target_goal));
        }

        let now = Utc::now();
        self.players = [
            PlayerRecord::from_seed(&player1),
            PlayerRecord::from_seed(&player2),
        ];
        self.foul_streaks = Default::default();
        self.ledger = TurnLedger::new();
        self.undo.clear();
        self.state = MatchState {
            phase: MatchPhase::InProgress,
            active_player: PlayerNumber::One,
            current_inning: 1,
            object_balls_on_table: FULL_RACK,
            break_player: None,
            is_break_shot: true,
            target_goal,
            pending_breaking_foul: None,
            winner: None,
            rack_held_by: Some(PlayerNumber::One),
        };

        let handicap_difference = player1.handicap - player2.handicap;
        if handicap_difference != 0 {
            let trailing = if handicap_difference > 0 {
                PlayerNumber::Two
            } else {
                PlayerNumber::One
            };
            let spot = handicap_difference.abs();
            self.players[trailing.index()].adjust(spot);
            self.append(trailing, TurnAction::HandicapApplied, spot, now);
            debug!(player = %trailing, spot, "Handicap applied");
        }

        self.clock.start(now);

        info!(
            player1 = %self.players[0].name,
            player2 = %self.players[1].name,
            target_goal,
            "Match started"
        );
        Ok(ActionReport::default())
    }

    /// Returns the table to the pre-game state, keeping names and handicaps
    pub fn reset(&mut self) {
        let target_goal = self.state.target_goal;
        self.players = [
            PlayerRecord::new(self.players[0].name.clone(), self.players[0].handicap),
            PlayerRecord::new(self.players[1].name.clone(), self.players[1].handicap),
        ];
        self.state = MatchState {
            target_goal,
            ..MatchState::default()
        };
        self.foul_streaks = Default::default();
        self.ledger = TurnLedger::new();
        self.undo.clear();
        self.clock.reset();
        info!("Match reset");
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    pub fn apply(
        &mut self,
        player: PlayerNumber,
        action: PlayerAction,
    ) -> Result<ActionReport, ActionRejected> {
        match action {
            PlayerAction::Points { amount } => self.adjust_score(player, amount),
            PlayerAction::FinishRack => self.finish_rack(player),
            PlayerAction::Foul => self.foul(player),
            PlayerAction::Scratch => self.scratch(player),
            PlayerAction::IntentionalFoul => self.intentional_foul(player),
            PlayerAction::Safety => self.safety(player),
            PlayerAction::Miss => self.miss(player),
            PlayerAction::BreakingFoul => self.breaking_foul(player),
            PlayerAction::ContinueAfterBreakingFoul => self.continue_after_breaking_foul(),
            PlayerAction::Rebreak => self.rebreak(),
            PlayerAction::SwitchTurn => self.switch_turn(),
            PlayerAction::Undo => self.undo(),
        }
    }

    /// Adds `amount` to the player's score. A positive amount extends the run
    /// and removes balls from the table; anything else ends the turn.
    pub fn adjust_score(
        &mut self,
        player: PlayerNumber,
        amount: i32,
    ) -> Result<ActionReport, ActionRejected> {
        self.ensure_turn(player)?;
        self.ensure_amount(player, amount)?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        self.credit_break(player, amount);
        let record = &mut self.players[player.index()];
        if amount > 0 {
            record.score_points(amount as u32);
        } else {
            record.adjust(amount);
            record.end_run();
        }
        self.state.is_break_shot = false;
        self.append(player, TurnAction::Points, amount, now);

        if amount > 0 {
            self.foul_streaks[player.index()].clear();
            report.rack_reset = self.remove_balls(amount);
        }

        if self.check_win(player, now, &mut report) {
            return Ok(report);
        }

        if amount <= 0 {
            self.end_clean_turn(player, &mut report);
        }
        Ok(report)
    }

    /// Credits every ball but the one left as the break ball and re-racks.
    /// The shooter stays at the table.
    pub fn finish_rack(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.ensure_turn(player)?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        let points = u32::from(self.state.object_balls_on_table.saturating_sub(1));
        self.credit_break(player, points as i32);

        let held_rack = self.state.rack_held_by == Some(player);
        let record = &mut self.players[player.index()];
        record.score_points(points);
        if held_rack {
            record.break_and_runs += 1;
        }
        self.state.is_break_shot = false;
        self.append(player, TurnAction::FinishRack, points as i32, now);

        if points > 0 {
            self.foul_streaks[player.index()].clear();
        }
        self.rerack(player);
        report.rack_reset = true;

        self.check_win(player, now, &mut report);
        Ok(report)
    }

    pub fn foul(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.apply_foul(player, TurnAction::Foul)
    }

    pub fn scratch(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.apply_foul(player, TurnAction::Scratch)
    }

    pub fn intentional_foul(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.apply_foul(player, TurnAction::IntentionalFoul)
    }

    pub fn safety(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.ensure_turn(player)?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        let record = &mut self.players[player.index()];
        record.safes += 1;
        record.defensive_shots += 1;
        record.end_run();
        self.append(player, TurnAction::Safety, 0, now);
        self.end_clean_turn(player, &mut report);
        Ok(report)
    }

    pub fn miss(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.ensure_turn(player)?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        let record = &mut self.players[player.index()];
        record.misses += 1;
        record.end_run();
        self.append(player, TurnAction::Miss, 0, now);
        self.end_clean_turn(player, &mut report);
        Ok(report)
    }

    /// Opens the continue-or-rebreak decision. Nothing is charged until one
    /// of [`Self::continue_after_breaking_foul`] or [`Self::rebreak`] is chosen.
    pub fn breaking_foul(&mut self, player: PlayerNumber) -> Result<ActionReport, ActionRejected> {
        self.ensure_turn(player)?;
        self.state.pending_breaking_foul = Some(player);
        debug!(player = %player, "Breaking foul awaiting decision");
        Ok(ActionReport {
            awaiting_breaking_foul_choice: true,
            ..ActionReport::default()
        })
    }

    /// Charges the breaking foul and passes the table to the opponent
    pub fn continue_after_breaking_foul(&mut self) -> Result<ActionReport, ActionRejected> {
        let player = self.resolve_breaking_foul()?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        self.charge_breaking_foul(player, TurnAction::BreakingFoul, now, &mut report);
        self.end_turn(player, &mut report);
        Ok(report)
    }

    /// Charges the breaking foul, re-racks and has the same player break again
    pub fn rebreak(&mut self) -> Result<ActionReport, ActionRejected> {
        let player = self.resolve_breaking_foul()?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        self.charge_breaking_foul(player, TurnAction::BreakingFoulRebreak, now, &mut report);
        self.rerack(player);
        self.state.is_break_shot = true;
        report.rack_reset = true;
        Ok(report)
    }

    /// Manual pass of the table with no score effect
    pub fn switch_turn(&mut self) -> Result<ActionReport, ActionRejected> {
        self.ensure_in_progress()?;
        if let Some(pending) = self.state.pending_breaking_foul {
            return Err(ActionRejected::BreakingFoulPending(pending));
        }
        let player = self.state.active_player;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        self.players[player.index()].end_run();
        self.append(player, TurnAction::TurnPassed, 0, now);
        self.end_clean_turn(player, &mut report);
        Ok(report)
    }

    /// Reverts the most recent action. While a breaking foul decision is open
    /// this only withdraws the breaking foul.
    pub fn undo(&mut self) -> Result<ActionReport, ActionRejected> {
        self.ensure_in_progress()?;
        if let Some(player) = self.state.pending_breaking_foul.take() {
            debug!(player = %player, "Breaking foul withdrawn");
            return Ok(ActionReport::default());
        }

        let snapshot = self.undo.pop().ok_or(ActionRejected::NothingToUndo)?;
        self.restore(snapshot);
        debug!(depth = self.undo.len(), "Action undone");
        Ok(ActionReport::default())
    }

    pub fn pause_clock(&mut self) -> Result<(), ActionRejected> {
        self.ensure_in_progress()?;
        self.clock.pause(Utc::now());
        Ok(())
    }

    pub fn resume_clock(&mut self) -> Result<(), ActionRejected> {
        self.ensure_in_progress()?;
        self.clock.resume(Utc::now());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_not_started(&self) -> Result<(), ActionRejected> {
        match self.state.phase {
            MatchPhase::NotStarted => Ok(()),
            MatchPhase::InProgress => Err(ActionRejected::AlreadyStarted),
            MatchPhase::Finished => Err(ActionRejected::GameFinished),
        }
    }

    fn ensure_in_progress(&self) -> Result<(), ActionRejected> {
        match self.state.phase {
            MatchPhase::NotStarted => Err(ActionRejected::NotStarted),
            MatchPhase::InProgress => Ok(()),
            MatchPhase::Finished => Err(ActionRejected::GameFinished),
        }
    }

    fn ensure_turn(&self, player: PlayerNumber) -> Result<(), ActionRejected> {
        self.ensure_in_progress()?;
        if let Some(pending) = self.state.pending_breaking_foul {
            return Err(ActionRejected::BreakingFoulPending(pending));
        }
        if player != self.state.active_player {
            return Err(ActionRejected::NotActivePlayer(player));
        }
        Ok(())
    }

    /// The amount must leave the score and run counters representable
    fn ensure_amount(&self, player: PlayerNumber, amount: i32) -> Result<(), ActionRejected> {
        let record = &self.players[player.index()];
        let fits = match u32::try_from(amount) {
            Ok(points) if points > 0 => {
                record.score.checked_add_unsigned(points).is_some()
                    && record.total_points.checked_add(points).is_some()
                    && record.current_run.checked_add(points).is_some()
            }
            _ => record.score.checked_add(amount).is_some(),
        };
        if fits {
            Ok(())
        } else {
            Err(ActionRejected::InvalidAmount(amount))
        }
    }

    fn resolve_breaking_foul(&mut self) -> Result<PlayerNumber, ActionRejected> {
        self.ensure_in_progress()?;
        self.state
            .pending_breaking_foul
            .take()
            .ok_or(ActionRejected::NoBreakingFoulPending)
    }

    fn push_snapshot(&mut self) {
        let snapshot = UndoSnapshot {
            players: self.players.clone(),
            active_player: self.state.active_player,
            current_inning: self.state.current_inning,
            object_balls_on_table: self.state.object_balls_on_table,
            break_player: self.state.break_player,
            is_break_shot: self.state.is_break_shot,
            rack_held_by: self.state.rack_held_by,
            foul_streaks: self.foul_streaks.clone(),
            ledger_len: self.ledger.len(),
        };
        self.undo.push(snapshot);
    }

    fn restore(&mut self, snapshot: UndoSnapshot) {
        for (record, saved) in self.players.iter_mut().zip(snapshot.players.iter()) {
            record.restore_from(saved);
        }
        self.state.active_player = snapshot.active_player;
        self.state.current_inning = snapshot.current_inning;
        self.state.object_balls_on_table = snapshot.object_balls_on_table;
        self.state.break_player = snapshot.break_player;
        self.state.is_break_shot = snapshot.is_break_shot;
        self.state.rack_held_by = snapshot.rack_held_by;
        self.foul_streaks = snapshot.foul_streaks;
        self.ledger.truncate(snapshot.ledger_len);
    }

    fn append(&mut self, player: PlayerNumber, action: TurnAction, points: i32, now: DateTime<Utc>) {
        let record = &self.players[player.index()];
        self.ledger.push(Turn {
            inning: self.state.current_inning,
            player_number: player,
            player_name: record.name.clone(),
            action,
            points,
            timestamp: now,
            score_after: record.score,
        });
    }

    fn credit_break(&mut self, player: PlayerNumber, points: i32) {
        if points > 0 && self.state.break_player.is_none() {
            self.state.break_player = Some(player);
        }
    }

    /// Takes pocketed balls off the table. Returns true when the rack was reset.
    fn remove_balls(&mut self, amount: i32) -> bool {
        let remaining = i32::from(self.state.object_balls_on_table) - amount;
        if remaining <= 1 {
            self.rerack(self.state.active_player);
            true
        } else {
            self.state.object_balls_on_table = remaining as u8;
            false
        }
    }

    fn rerack(&mut self, shooter: PlayerNumber) {
        self.state.object_balls_on_table = FULL_RACK;
        self.state.rack_held_by = Some(shooter);
    }

    fn penalty_for(&self, action: TurnAction) -> i32 {
        match action {
            TurnAction::Foul => self.rules.foul_penalty,
            TurnAction::Scratch => self.rules.scratch_penalty,
            TurnAction::IntentionalFoul => self.rules.intentional_foul_penalty,
            TurnAction::BreakingFoul | TurnAction::BreakingFoulRebreak => {
                self.rules.breaking_foul_penalty
            }
            _ => 0,
        }
    }

    fn apply_foul(
        &mut self,
        player: PlayerNumber,
        action: TurnAction,
    ) -> Result<ActionReport, ActionRejected> {
        self.ensure_turn(player)?;
        let now = Utc::now();
        self.push_snapshot();
        let mut report = ActionReport::default();

        let penalty = self.penalty_for(action);
        let record = &mut self.players[player.index()];
        record.adjust(-penalty);
        match action {
            TurnAction::Scratch => record.scratches += 1,
            TurnAction::IntentionalFoul => record.intentional_fouls += 1,
            _ => record.fouls += 1,
        }
        record.total_innings += 1;
        record.end_run();
        self.append(player, action, -penalty, now);

        self.register_foul(player, now, &mut report);
        self.end_turn(player, &mut report);
        Ok(report)
    }

    fn charge_breaking_foul(
        &mut self,
        player: PlayerNumber,
        action: TurnAction,
        now: DateTime<Utc>,
        report: &mut ActionReport,
    ) {
        let penalty = self.penalty_for(action);
        let record = &mut self.players[player.index()];
        record.adjust(-penalty);
        record.breaking_fouls += 1;
        record.end_run();
        self.append(player, action, -penalty, now);
        self.register_foul(player, now, report);
    }

    fn register_foul(&mut self, player: PlayerNumber, now: DateTime<Utc>, report: &mut ActionReport) {
        let streak = &mut self.foul_streaks[player.index()];
        if streak.register_foul() {
            let penalty = self.rules.three_foul_penalty;
            self.players[player.index()].adjust(-penalty);
            self.append(player, TurnAction::ThreeFoulPenalty, -penalty, now);
            report.three_foul_penalty = true;
            warn!(player = %player, penalty, "Three consecutive fouls");
        } else {
            report.foul_warning = streak.is_on_warning();
        }
    }

    fn check_win(&mut self, player: PlayerNumber, now: DateTime<Utc>, report: &mut ActionReport) -> bool {
        let score = self.players[player.index()].score;
        if score < self.state.target_goal {
            return false;
        }
        self.state.phase = MatchPhase::Finished;
        self.state.winner = Some(player);
        self.clock.stop(now);
        report.winner = Some(player);
        info!(
            winner = %player,
            score,
            target_goal = self.state.target_goal,
            "Match won"
        );
        true
    }

    fn end_clean_turn(&mut self, player: PlayerNumber, report: &mut ActionReport) {
        if self.rules.clean_turn_resets_foul_streak {
            self.foul_streaks[player.index()].register_clean_turn();
        }
        self.end_turn(player, report);
    }

    fn end_turn(&mut self, player: PlayerNumber, report: &mut ActionReport) {
        self.players[player.index()].end_run();
        self.state.is_break_shot = false;
        self.state.rack_held_by = None;
        self.state.active_player = player.opponent();
        if player == PlayerNumber::Two {
            self.state.current_inning += 1;
        }
        report.turn_passed = true;
    }
}
