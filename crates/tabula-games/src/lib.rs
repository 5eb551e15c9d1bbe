//! Bundled games for the Tabula engine.
//!
//! Two small games prove that one engine contract carries very different
//! rule sets:
//! - [`lots`]: a sealed-bid auction series (simultaneous bidding, tie
//!   resolution, turn-order reseeding, System auto-bids)
//! - [`relay`]: a hex-grid checkpoint race (board graphs, movement floods,
//!   gated pathfinding, System auto-passes)

pub mod lots;
pub mod relay;

pub use lots::{Lots, LotsAction, LotsBoard, LotsPhase, LotsPlayer};
pub use relay::{Relay, RelayAction, RelayBoard, RelayPhase, Runner};
