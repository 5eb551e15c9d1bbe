//! Engine error types.
//!
//! Two recoverable classes and one fatal class:
//! - [`SchemaError`](crate::hydrate::SchemaError): a malformed raw payload,
//!   rejected at the hydration boundary before any game logic runs.
//! - [`RuleError`]: a well-formed action that violates a game rule.
//! - [`InvariantError`]: a broken engine-internal invariant. These indicate
//!   a bug in a game or a corrupted log and are never repaired automatically.

use crate::auction::AuctionError;
use crate::hydrate::SchemaError;
use crate::turn::TurnError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A well-formed action that violates a game rule.
///
/// Carries a human-readable reason. Raised by `apply`, `is_valid_action`
/// re-checks, and the turn/auction components.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rule violation: {reason}")]
pub struct RuleError {
    /// Why the action was rejected
    pub reason: String,
}

impl RuleError {
    /// Create a rule error with the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<TurnError> for RuleError {
    fn from(err: TurnError) -> Self {
        RuleError::new(err.to_string())
    }
}

impl From<AuctionError> for RuleError {
    fn from(err: AuctionError) -> Self {
        RuleError::new(err.to_string())
    }
}

/// A broken engine-internal invariant. Fatal: the log or a game
/// implementation is corrupt, not a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvariantError {
    #[error("checksum mismatch after replaying {actions} actions: expected {expected:#018x}, got {actual:#018x}")]
    ChecksumMismatch {
        actions: u64,
        expected: u64,
        actual: u64,
    },

    #[error("action count mismatch: state says {state_count}, log holds {log_count}")]
    ActionCountMismatch { state_count: u64, log_count: u64 },

    #[error("turn order is not a permutation of the player set")]
    TurnOrderCorrupted,

    #[error("action log index {index} does not match expected {expected}")]
    LogIndexMismatch { index: u64, expected: u64 },
}

/// Umbrella error returned by the dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed raw payload (hydration boundary)
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Well-formed action violating a game rule
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Broken engine-internal invariant (fatal)
    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

impl EngineError {
    /// Whether the error is recoverable by the caller (reject and retry a
    /// different action) as opposed to a fatal invariant break.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Invariant(_))
    }
}
