//! Phase machine: per-state handlers and the dispatch context.
//!
//! Each named machine state gets one [`PhaseHandler`]. Handlers guard which
//! actions are legal, apply state-specific consequences, pick the next
//! phase, and may enqueue System-sourced follow-on actions through the
//! [`MachineContext`] (an automatic pass when no legal move exists, a
//! forced resolution step, and so on). The dispatcher drains that queue in
//! FIFO order until the game genuinely awaits external input.

use crate::action::{ActionKindOf, ActionRecord};
use crate::config::GameConfig;
use crate::error::RuleError;
use crate::game::Game;
use crate::state::{GameState, PlayerId};
use std::collections::VecDeque;

/// A System action waiting to be dispatched
#[derive(Debug, Clone)]
pub struct PendingAction<G: Game> {
    pub player_id: Option<PlayerId>,
    pub body: G::Action,
}

/// Per-dispatch context handed to handlers and action `apply`
pub struct MachineContext<'a, G: Game> {
    config: &'a GameConfig,
    pending: VecDeque<PendingAction<G>>,
}

impl<'a, G: Game> MachineContext<'a, G> {
    pub fn new(config: &'a GameConfig) -> Self {
        Self {
            config,
            pending: VecDeque::new(),
        }
    }

    /// Resolved game configuration
    pub fn config(&self) -> &GameConfig {
        self.config
    }

    /// Enqueue a System action on behalf of a player
    pub fn add_system_action(&mut self, player_id: PlayerId, body: G::Action) {
        self.pending.push_back(PendingAction {
            player_id: Some(player_id),
            body,
        });
    }

    /// Enqueue a game-level System action with no acting player
    pub fn add_pending_action(&mut self, body: G::Action) {
        self.pending.push_back(PendingAction {
            player_id: None,
            body,
        });
    }

    /// Dequeue the next pending System action (FIFO)
    pub fn pop_pending(&mut self) -> Option<PendingAction<G>> {
        self.pending.pop_front()
    }

    /// Whether any System actions are waiting
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Behavior of one named machine state.
///
/// `valid_actions_for` must be consistent with `is_valid_action`: any kind
/// it lists for a player must pass the guard for a well-formed action of
/// that kind.
pub trait PhaseHandler<G: Game> {
    /// Type-and-business-rule guard for an incoming action
    fn is_valid_action(
        &self,
        state: &GameState<G>,
        ctx: &MachineContext<'_, G>,
        action: &ActionRecord<G::Action>,
    ) -> bool;

    /// Action kinds currently legal for a player (UI and agent surface)
    fn valid_actions_for(
        &self,
        state: &GameState<G>,
        ctx: &MachineContext<'_, G>,
        player: &PlayerId,
    ) -> Vec<ActionKindOf<G>>;

    /// Runs once on transition into this state; may enqueue System actions
    fn enter(
        &self,
        state: &mut GameState<G>,
        ctx: &mut MachineContext<'_, G>,
    ) -> Result<(), RuleError> {
        let _ = (state, ctx);
        Ok(())
    }

    /// State-specific consequence of a just-applied action; returns the
    /// next phase (possibly this one, for multi-step phases).
    fn on_action(
        &self,
        state: &mut GameState<G>,
        ctx: &mut MachineContext<'_, G>,
        action: &ActionRecord<G::Action>,
    ) -> Result<G::Phase, RuleError>;

    /// Players whose input this state awaits; drives `active_player_ids`
    fn awaiting_input(&self, state: &GameState<G>, ctx: &MachineContext<'_, G>) -> Vec<PlayerId> {
        let _ = ctx;
        state.turns.current_player().cloned().into_iter().collect()
    }
}
