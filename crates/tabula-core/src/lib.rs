//! Tabula - a deterministic engine for turn-based multiplayer games
//!
//! This crate provides the game-agnostic core, including:
//! - Declarative schema validation for everything that crosses the wire
//! - A seeded, counter-addressable PRNG so replays stay bit-identical
//! - Square and hex coordinate math, shape iterators, and grid graphs
//! - Turn rotation, simultaneous sealed-bid auctions, and a phase machine
//! - A dispatcher that validates, applies, checksums, and cascades actions
//!
//! # Architecture
//!
//! A concrete game implements the [`Game`] trait: a board type, per-player
//! data, a closed action enum, and one [`PhaseHandler`] per named machine
//! state. The engine owns everything else. State is a pure function of the
//! seed and the ordered action log, so any game can be rebuilt, explored,
//! or undone by replaying.
//!
//! # Modules
//!
//! - [`hydrate`]: schema checking and JSON (de)hydration
//! - [`rng`]: resumable seeded randomness
//! - [`coords`], [`pattern`], [`graph`]: board geometry and traversal
//! - [`turn`], [`auction`]: player rotation and bid resolution
//! - [`state`], [`action`], [`machine`], [`game`]: the game contract
//! - [`dispatch`]: the engine front door

pub mod action;
pub mod auction;
pub mod config;
pub mod coords;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod graph;
pub mod hydrate;
pub mod machine;
pub mod pattern;
pub mod rng;
pub mod state;
pub mod turn;

// Re-export commonly used types
pub use action::{ActionBody, ActionKindOf, ActionRecord, ActionSource};
pub use auction::{AuctionError, Participant, SimultaneousAuction, TieResolution};
pub use config::{ConfigValue, GameConfig, OptionDescriptor, OptionKind};
pub use coords::{AxialCoord, Coordinate, HexDirection, OffsetCoord, Orientation, Rotation, SquareDirection};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{EngineError, InvariantError, RuleError};
pub use game::{Game, Seat, Setup};
pub use graph::{Graph, GridNode};
pub use hydrate::{FieldFailure, Hydrate, Kind, Schema, SchemaError};
pub use machine::{MachineContext, PendingAction, PhaseHandler};
pub use pattern::{HexLine, HexRing, HexSpiral, Rectangle, SquareLine, SquareRing, SquareSpiral};
pub use rng::GameRng;
pub use state::{fold_action_id, GameResult, GameState, PlayerId, PlayerState, CHECKSUM_SEED};
pub use turn::{Turn, TurnError, TurnManager};
