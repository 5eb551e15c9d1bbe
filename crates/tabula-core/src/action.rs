//! Action records and the per-action behavior contract.
//!
//! An action is a single, logged, replayable state transition request. The
//! wire shape is a flat JSON object: the shared envelope fields plus the
//! game-specific body, discriminated by a `type` string. In Rust the body is
//! a closed, internally tagged enum per game, so the `type` switch the
//! dispatcher performs is an exhaustive `match` checked by the compiler.
//!
//! Records are immutable once applied, except for `metadata`, which `apply`
//! produces exactly once so observers and log viewers can explain what
//! happened without re-deriving it from state deltas. Applied records form
//! an append-only, index-ordered log; they are never destroyed.

use crate::error::RuleError;
use crate::game::Game;
use crate::hydrate::{Hydrate, Kind, Schema};
use crate::machine::MachineContext;
use crate::state::{GameState, PlayerId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who produced an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionSource {
    /// Submitted by a player over the wire
    User,
    /// Synthesized by a phase handler (e.g. an automatic pass)
    System,
}

/// One logged action: shared envelope plus game-specific body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord<A> {
    /// Unique action id; the unit the checksum folds over
    pub id: String,
    /// Which game instance this belongs to
    pub game_id: String,
    /// Acting player; `None` for game-level System actions
    pub player_id: Option<PlayerId>,
    /// Position in the append-only log
    pub index: u64,
    /// Player-submitted or engine-synthesized
    pub source: ActionSource,
    /// Whether applying this action reveals hidden information
    pub reveals_info: bool,
    /// Written exactly once during apply
    pub metadata: Option<Value>,
    /// Game-specific body, `type`-discriminated on the wire
    #[serde(flatten)]
    pub body: A,
}

/// Envelope shape shared by every action payload
pub fn action_envelope_schema() -> Schema {
    Schema::object("action")
        .field("id", Kind::Text)
        .field("type", Kind::Text)
        .field("gameId", Kind::Text)
        .optional("playerId", Kind::Text)
        .field("index", Kind::Integer)
        .field("source", Kind::Text)
        .field("revealsInfo", Kind::Bool)
        .optional("metadata", Kind::Any)
}

impl<A> Hydrate for ActionRecord<A>
where
    A: Serialize + DeserializeOwned,
{
    fn schema() -> Schema {
        action_envelope_schema()
    }
}

/// Behavior contract for a game's action body enum.
///
/// `apply` must re-validate its own preconditions against the *current*
/// state even when a caller already checked validity upstream (stale
/// validation is a real hazard), raise a [`RuleError`] before touching any
/// field, mutate state directly, and return its metadata value.
pub trait ActionBody<G: Game>:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + 'static
{
    /// Closed, fieldless discriminant enum for this game's actions
    type Kind: Copy + Eq + fmt::Debug + Serialize + 'static;

    /// Discriminant of this body
    fn kind(&self) -> Self::Kind;

    /// Validate against the current state, mutate, and return the metadata
    /// to be written into the record.
    fn apply(
        &self,
        record: &ActionRecord<G::Action>,
        state: &mut GameState<G>,
        ctx: &mut MachineContext<'_, G>,
    ) -> Result<Value, RuleError>;
}

/// Shorthand for a game's action discriminant type
pub type ActionKindOf<G> = <<G as Game>::Action as ActionBody<G>>::Kind;
