//! Top-level dispatch: validate, apply, checksum, transition, cascade.
//!
//! The dispatcher is the engine's single entry point for mutating a game.
//! Per game instance it is strictly sequential: one action is processed to
//! completion, including every cascaded System action, before another is
//! accepted. Callers own per-game exclusion; different games share no
//! mutable state and may run concurrently.
//!
//! Atomicity: the initiating action and its whole cascade run against a
//! scratch clone of the state, committed only on full success. A rule
//! violation raised at any depth leaves the canonical state and log
//! untouched.

use crate::action::{ActionBody, ActionKindOf, ActionRecord, ActionSource};
use crate::config::GameConfig;
use crate::error::{EngineError, InvariantError, RuleError};
use crate::game::{Game, Seat, Setup};
use crate::hydrate::Hydrate;
use crate::machine::{MachineContext, PendingAction};
use crate::rng::GameRng;
use crate::state::{GameState, PlayerId, PlayerState, CHECKSUM_SEED};
use crate::turn::TurnManager;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// What a successful dispatch did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOutcome<G: Game> {
    /// Phase the game settled in once the cascade drained
    pub phase: G::Phase,
    /// Records appended to the log (initiating action plus cascade)
    pub applied: u64,
}

/// Engine front door for one game type
pub struct Dispatcher<G: Game> {
    config: GameConfig,
    _game: PhantomData<G>,
}

impl<G: Game> Dispatcher<G> {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            _game: PhantomData,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Create a game: seed the PRNG, run the game's setup, enter the
    /// starting phase, and drain any System actions it enqueues. Returns
    /// the initial state and the log records produced on the way in.
    pub fn create_game(
        &self,
        state_id: &str,
        game_id: &str,
        seed: u64,
        seats: &[Seat],
    ) -> Result<(GameState<G>, Vec<ActionRecord<G::Action>>), EngineError> {
        if seats.is_empty() {
            return Err(RuleError::new("a game needs at least one player").into());
        }

        let mut rng = GameRng::new(seed);
        let Setup {
            board,
            player_data,
            phase,
        } = G::setup(&self.config, seats, &mut rng)?;
        if player_data.len() != seats.len() {
            return Err(RuleError::new("setup produced player data for the wrong seat count").into());
        }

        let players: Vec<PlayerState<G::PlayerData>> = seats
            .iter()
            .zip(player_data)
            .map(|(seat, data)| PlayerState {
                id: seat.id.clone(),
                name: seat.name.clone(),
                data,
            })
            .collect();
        let turn_order: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();

        let mut state = GameState {
            id: state_id.to_string(),
            game_id: game_id.to_string(),
            rng,
            turns: TurnManager::new(turn_order),
            players,
            active_player_ids: Vec::new(),
            phase,
            action_count: 0,
            action_checksum: CHECKSUM_SEED,
            result: None,
            winning_player_ids: Vec::new(),
            board,
        };

        debug!(game = G::name(), game_id, seed, "created game");

        let mut applied = Vec::new();
        let mut ctx = MachineContext::new(&self.config);
        G::handler(state.phase).enter(&mut state, &mut ctx)?;
        self.drain_pending(&mut state, &mut applied, &mut ctx)?;
        self.refresh_active_players(&mut state);

        Ok((state, applied))
    }

    /// Dispatch a raw wire payload against the current state.
    ///
    /// Rejections (schema or rule) leave `state` and `log` untouched.
    pub fn dispatch(
        &self,
        state: &mut GameState<G>,
        log: &mut Vec<ActionRecord<G::Action>>,
        raw: &Value,
    ) -> Result<DispatchOutcome<G>, EngineError> {
        let action = ActionRecord::<G::Action>::hydrate(raw)?;
        self.dispatch_record(state, log, action)
    }

    /// Dispatch an already-hydrated action record.
    pub fn dispatch_record(
        &self,
        state: &mut GameState<G>,
        log: &mut Vec<ActionRecord<G::Action>>,
        mut action: ActionRecord<G::Action>,
    ) -> Result<DispatchOutcome<G>, EngineError> {
        if state.is_finished() {
            return Err(RuleError::new("the game is over").into());
        }
        if action.game_id != state.game_id {
            return Err(RuleError::new(format!(
                "action targets game '{}', this is game '{}'",
                action.game_id, state.game_id
            ))
            .into());
        }
        if action.index != state.action_count {
            return Err(RuleError::new(format!(
                "stale action: submitted at index {}, game is at {}",
                action.index, state.action_count
            ))
            .into());
        }
        if action.source != ActionSource::User {
            return Err(RuleError::new("only user actions may be submitted").into());
        }
        // Metadata is an output field; apply writes it exactly once
        action.metadata = None;

        let mut scratch = state.clone();
        let mut applied = Vec::new();
        self.apply_cascade(&mut scratch, &mut applied, action)?;

        let outcome = DispatchOutcome {
            phase: scratch.phase,
            applied: applied.len() as u64,
        };
        *state = scratch;
        log.extend(applied);
        Ok(outcome)
    }

    /// Steps 1-8 of the dispatch cycle for one action, recursing into the
    /// System actions it enqueues.
    fn apply_cascade(
        &self,
        state: &mut GameState<G>,
        applied: &mut Vec<ActionRecord<G::Action>>,
        mut action: ActionRecord<G::Action>,
    ) -> Result<(), EngineError> {
        let handler = G::handler(state.phase);
        let mut ctx = MachineContext::new(&self.config);

        if !handler.is_valid_action(state, &ctx, &action) {
            return Err(RuleError::new(format!(
                "action {:?} is not valid in phase {:?}",
                action.body.kind(),
                state.phase
            ))
            .into());
        }

        let metadata = action.body.apply(&action, state, &mut ctx)?;
        action.metadata = Some(metadata);
        state.record_applied(&action.id);

        let next = handler.on_action(state, &mut ctx, &action)?;
        let changed = next != state.phase;
        trace!(
            action = %action.id,
            kind = ?action.body.kind(),
            source = ?action.source,
            "applied action"
        );
        applied.push(action);

        if changed {
            debug!(from = ?state.phase, to = ?next, "phase transition");
            state.phase = next;
            G::handler(next).enter(state, &mut ctx)?;
        }

        self.drain_pending(state, applied, &mut ctx)?;
        self.refresh_active_players(state);
        Ok(())
    }

    /// Drain queued System actions in FIFO order, recursing through
    /// `apply_cascade` for each. Stops early if the game finishes.
    fn drain_pending(
        &self,
        state: &mut GameState<G>,
        applied: &mut Vec<ActionRecord<G::Action>>,
        ctx: &mut MachineContext<'_, G>,
    ) -> Result<(), EngineError> {
        while let Some(pending) = ctx.pop_pending() {
            if state.is_finished() {
                trace!("game finished, dropping remaining pending actions");
                break;
            }
            let record = self.system_record(state, pending);
            self.apply_cascade(state, applied, record)?;
        }
        Ok(())
    }

    /// Build the record for an engine-synthesized action. The id is a pure
    /// function of game id and log position so replays refold identically.
    fn system_record(
        &self,
        state: &GameState<G>,
        pending: PendingAction<G>,
    ) -> ActionRecord<G::Action> {
        ActionRecord {
            id: format!("{}/sys/{}", state.game_id, state.action_count),
            game_id: state.game_id.clone(),
            player_id: pending.player_id,
            index: state.action_count,
            source: ActionSource::System,
            reveals_info: false,
            metadata: None,
            body: pending.body,
        }
    }

    fn refresh_active_players(&self, state: &mut GameState<G>) {
        if state.is_finished() {
            state.active_player_ids.clear();
            return;
        }
        let ctx = MachineContext::new(&self.config);
        state.active_player_ids = G::handler(state.phase).awaiting_input(state, &ctx);
    }

    /// Read-only introspection: action kinds currently legal for a player
    pub fn valid_actions(&self, state: &GameState<G>, player: &PlayerId) -> Vec<ActionKindOf<G>> {
        if state.is_finished() {
            return Vec::new();
        }
        let ctx = MachineContext::new(&self.config);
        G::handler(state.phase).valid_actions_for(state, &ctx, player)
    }

    /// Full resync check: log index continuity, count + checksum refold,
    /// and the turn-order permutation invariant. Failures are fatal.
    pub fn verify(
        &self,
        state: &GameState<G>,
        log: &[ActionRecord<G::Action>],
    ) -> Result<(), InvariantError> {
        for (position, record) in log.iter().enumerate() {
            if record.index != position as u64 {
                return Err(InvariantError::LogIndexMismatch {
                    index: record.index,
                    expected: position as u64,
                });
            }
        }
        state.verify_log(log.iter().map(|record| record.id.as_str()))?;
        state.check_turn_order()
    }

    /// Fork a speculative branch: a deep copy of state and log that
    /// diverges independently and can be discarded without side effects.
    pub fn explore(
        &self,
        state: &GameState<G>,
        log: &[ActionRecord<G::Action>],
    ) -> (GameState<G>, Vec<ActionRecord<G::Action>>) {
        (state.clone(), log.to_vec())
    }

    /// Rebuild state from the seed by re-dispatching the log's User
    /// actions. System records are regenerated by the cascade, so two
    /// replays of the same log reach bit-identical state and checksum.
    pub fn replay(
        &self,
        state_id: &str,
        game_id: &str,
        seed: u64,
        seats: &[Seat],
        log: &[ActionRecord<G::Action>],
    ) -> Result<(GameState<G>, Vec<ActionRecord<G::Action>>), EngineError> {
        self.replay_user_actions(
            state_id,
            game_id,
            seed,
            seats,
            log.iter().filter(|r| r.source == ActionSource::User),
        )
    }

    /// Undo: drop the last `user_actions_to_drop` User actions and replay
    /// the rest. Never reverses individual mutations.
    pub fn undo(
        &self,
        state_id: &str,
        game_id: &str,
        seed: u64,
        seats: &[Seat],
        log: &[ActionRecord<G::Action>],
        user_actions_to_drop: usize,
    ) -> Result<(GameState<G>, Vec<ActionRecord<G::Action>>), EngineError> {
        let user: Vec<&ActionRecord<G::Action>> = log
            .iter()
            .filter(|r| r.source == ActionSource::User)
            .collect();
        let keep = user.len().saturating_sub(user_actions_to_drop);
        self.replay_user_actions(
            state_id,
            game_id,
            seed,
            seats,
            user.into_iter().take(keep),
        )
    }

    fn replay_user_actions<'a>(
        &self,
        state_id: &str,
        game_id: &str,
        seed: u64,
        seats: &[Seat],
        actions: impl Iterator<Item = &'a ActionRecord<G::Action>>,
    ) -> Result<(GameState<G>, Vec<ActionRecord<G::Action>>), EngineError> {
        let (mut state, mut log) = self.create_game(state_id, game_id, seed, seats)?;
        for record in actions {
            let mut fresh = record.clone();
            fresh.metadata = None;
            // Indices are re-derived; the deterministic cascade reproduces
            // the original interleaving
            fresh.index = state.action_count;
            self.dispatch_record(&mut state, &mut log, fresh)?;
        }
        Ok((state, log))
    }
}
