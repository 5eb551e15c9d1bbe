//! The contract a concrete game implements to run on the engine.
//!
//! A game supplies its state shape (board and per-player data), a closed
//! action enum, a set of named machine states with handlers, and a setup
//! function. The engine supplies everything else: hydration, deterministic
//! randomness, turn management, checksums, dispatch, replay, undo, and
//! exploration.

use crate::action::ActionBody;
use crate::config::{GameConfig, OptionDescriptor};
use crate::error::RuleError;
use crate::machine::PhaseHandler;
use crate::rng::GameRng;
use crate::state::PlayerId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

/// A player joining a new game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
}

impl Seat {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// What `Game::setup` produces: the initial game-specific state
pub struct Setup<G: Game> {
    pub board: G::Board,
    /// One entry per seat, in seating order
    pub player_data: Vec<G::PlayerData>,
    pub phase: G::Phase,
}

/// A concrete game definition.
///
/// Implementors are zero-sized marker types (derive `Clone`, `Copy`,
/// `Debug`, `PartialEq`); all state lives in
/// [`GameState`](crate::state::GameState). Handler lookup is an exhaustive
/// `match` in `handler`, so adding a machine state without a handler is a
/// compile error.
pub trait Game: Sized + Clone + Copy + fmt::Debug + PartialEq + 'static {
    /// Game-specific state fields
    type Board: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned;
    /// Game-specific per-player fields
    type PlayerData: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned;
    /// Closed action body enum, `type`-tagged on the wire
    type Action: ActionBody<Self>;
    /// Named machine states (fieldless; phase data lives in `Board`)
    type Phase: Copy + Eq + Hash + fmt::Debug + Serialize + DeserializeOwned;

    /// Stable identifier, used as the `game_id` prefix
    fn name() -> &'static str;

    /// Option descriptors for the surrounding UI; the engine never reads
    /// them
    fn options() -> Vec<OptionDescriptor> {
        Vec::new()
    }

    /// Handler for a machine state (exhaustive match over `Phase`)
    fn handler(phase: Self::Phase) -> &'static dyn PhaseHandler<Self>;

    /// Build the initial board, per-player data, and starting phase. All
    /// randomness must come from `rng`.
    fn setup(config: &GameConfig, seats: &[Seat], rng: &mut GameRng) -> Result<Setup<Self>, RuleError>;
}
