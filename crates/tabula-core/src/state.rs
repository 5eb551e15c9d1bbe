//! Shared game state composition.
//!
//! Every concrete game composes the same base: identity, the seeded PRNG,
//! the turn manager, player records, the current machine phase, and the
//! running action count/checksum. Game-specific fields hang off
//! `GameState::board` and `PlayerState::data` through the [`Game`] trait's
//! associated types.
//!
//! `action_count` and `action_checksum` must always equal a pure fold over
//! the action log from index 0; [`GameState::verify_log`] is the full
//! resync check callers use to detect divergence between replicas.

use crate::error::InvariantError;
use crate::game::Game;
use crate::hydrate::{Hydrate, Kind, Schema};
use crate::rng::GameRng;
use crate::turn::TurnManager;
use serde::{Deserialize, Serialize};

/// Player identifier as it appears on the wire
pub type PlayerId = String;

/// FNV-1a 64-bit offset basis; the checksum of an empty action log
pub const CHECKSUM_SEED: u64 = 0xcbf2_9ce4_8422_2325;

const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fold one applied action id into a running checksum (FNV-1a over the id
/// bytes, seeded with the previous checksum).
pub fn fold_action_id(checksum: u64, action_id: &str) -> u64 {
    let mut hash = checksum;
    for byte in action_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameResult {
    /// Someone won; see `winning_player_ids`
    Won,
    /// Finished with no single winner
    Draw,
    /// Abandoned before completion
    Abandoned,
}

/// One player's record: shared identity plus game-specific data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState<P> {
    pub id: PlayerId,
    pub name: String,
    pub data: P,
}

/// The complete state of one game instance.
///
/// Owned exclusively by that game; mutated only by action `apply` and by
/// phase handlers. Clone-to-fork is the exploration mechanism: a deep copy
/// diverges independently and can be discarded without side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct GameState<G: Game> {
    /// Unique id of this game instance
    pub id: String,
    /// Which game this is an instance of
    pub game_id: String,
    /// Seeded PRNG (seed + invocation counter, both persisted)
    pub rng: GameRng,
    /// Turn rotation and turn records
    pub turns: TurnManager,
    /// All players, in seating order
    pub players: Vec<PlayerState<G::PlayerData>>,
    /// Players whose input the game currently awaits
    pub active_player_ids: Vec<PlayerId>,
    /// Current machine state
    pub phase: G::Phase,
    /// Number of actions applied so far
    pub action_count: u64,
    /// Running fold over applied action ids
    pub action_checksum: u64,
    /// Set when the game is over
    pub result: Option<GameResult>,
    /// Winners, when `result` is `Won`
    pub winning_player_ids: Vec<PlayerId>,
    /// Game-specific fields
    pub board: G::Board,
}

impl<G: Game> GameState<G> {
    /// Get a player by id
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState<G::PlayerData>> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Get a mutable player by id
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState<G::PlayerData>> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    /// Ids of all players, in seating order
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    /// Whether the game has finished
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Advance the action count and checksum for one applied action
    pub fn record_applied(&mut self, action_id: &str) {
        self.action_checksum = fold_action_id(self.action_checksum, action_id);
        self.action_count += 1;
    }

    /// Full resync check: refold the complete ordered id list from index 0
    /// and compare against the persisted count and checksum. A mismatch is
    /// fatal (corrupted log or buggy game), never repaired automatically.
    pub fn verify_log<'a>(
        &self,
        action_ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), InvariantError> {
        let mut checksum = CHECKSUM_SEED;
        let mut count = 0u64;
        for id in action_ids {
            checksum = fold_action_id(checksum, id);
            count += 1;
        }
        if count != self.action_count {
            return Err(InvariantError::ActionCountMismatch {
                state_count: self.action_count,
                log_count: count,
            });
        }
        if checksum != self.action_checksum {
            return Err(InvariantError::ChecksumMismatch {
                actions: count,
                expected: self.action_checksum,
                actual: checksum,
            });
        }
        Ok(())
    }

    /// Invariant: the turn order is a permutation of the player set
    pub fn check_turn_order(&self) -> Result<(), InvariantError> {
        let mut order: Vec<&PlayerId> = self.turns.turn_order().iter().collect();
        let mut players: Vec<PlayerId> = self.player_ids();
        order.sort();
        players.sort();
        if order.iter().map(|id| id.as_str()).ne(players.iter().map(|id| id.as_str())) {
            return Err(InvariantError::TurnOrderCorrupted);
        }
        Ok(())
    }
}

impl<G: Game> Hydrate for GameState<G> {
    fn schema() -> Schema {
        let rng = Schema::object("rng")
            .field("seed", Kind::Integer)
            .field("invocations", Kind::Integer);
        let player = Schema::object("player")
            .field("id", Kind::Text)
            .field("name", Kind::Text)
            .field("data", Kind::Any);
        Schema::object("gameState")
            .field("id", Kind::Text)
            .field("gameId", Kind::Text)
            .field("rng", Kind::Object(Box::new(rng)))
            .field("turns", Kind::Map)
            .field("players", Kind::Array(Box::new(Kind::Object(Box::new(player)))))
            .field("activePlayerIds", Kind::Array(Box::new(Kind::Text)))
            .field("phase", Kind::Any)
            .field("actionCount", Kind::Integer)
            .field("actionChecksum", Kind::Integer)
            .optional("result", Kind::Text)
            .field("winningPlayerIds", Kind::Array(Box::new(Kind::Text)))
            .field("board", Kind::Any)
    }
}
