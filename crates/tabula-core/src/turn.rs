//! Turn ordering and the append-only turn record.
//!
//! A [`Turn`] is an interval of action indices attributed to one player:
//! open while `end` is unset, closed with an exclusive `end`. The
//! [`TurnManager`] owns the ordered `turn_order` list (always a permutation
//! of the player set), the append-only `series` of turns, and per-player
//! turn counts, and is the deterministic answer to "whose turn is it".

use crate::state::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Turn-manager rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TurnError {
    #[error("a turn is already open for player '{0}'")]
    TurnAlreadyOpen(PlayerId),

    #[error("no open turn to close")]
    NoOpenTurn,

    #[error("player '{0}' is not in the turn order")]
    UnknownPlayer(PlayerId),

    #[error("new order is not a permutation of the current player set")]
    NotAPermutation,
}

/// An interval of action indices attributed to one player.
///
/// `end` is exclusive of the action that closed the turn and unset while
/// the turn is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub player_id: PlayerId,
    pub start: u64,
    pub end: Option<u64>,
}

impl Turn {
    /// Whether the turn is still open
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Ordered turn rotation plus the append-only log of turn records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnManager {
    series: Vec<Turn>,
    turn_order: Vec<PlayerId>,
    turn_counts: HashMap<PlayerId, u32>,
}

impl TurnManager {
    /// Create a manager with the given rotation. Order must be non-empty
    /// and duplicate-free.
    pub fn new(turn_order: Vec<PlayerId>) -> Self {
        debug_assert!(!turn_order.is_empty(), "turn order cannot be empty");
        let turn_counts = turn_order.iter().map(|id| (id.clone(), 0)).collect();
        Self {
            series: Vec::new(),
            turn_order,
            turn_counts,
        }
    }

    /// The current rotation
    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    /// All turns, oldest first
    pub fn series(&self) -> &[Turn] {
        &self.series
    }

    /// Closed-turn count for a player
    pub fn turn_count(&self, player: &PlayerId) -> u32 {
        self.turn_counts.get(player).copied().unwrap_or(0)
    }

    /// The single open turn, if any
    pub fn current_turn(&self) -> Option<&Turn> {
        self.series.last().filter(|turn| turn.is_open())
    }

    /// The player whose turn is open, if any
    pub fn current_player(&self) -> Option<&PlayerId> {
        self.current_turn().map(|turn| &turn.player_id)
    }

    /// Open a new turn at `action_index`. Defaults to the head of the turn
    /// order when `player` is omitted. Fails if a turn is already open or
    /// the player is not in the rotation.
    pub fn start_turn(
        &mut self,
        player: Option<PlayerId>,
        action_index: u64,
    ) -> Result<(), TurnError> {
        if let Some(open) = self.current_turn() {
            return Err(TurnError::TurnAlreadyOpen(open.player_id.clone()));
        }
        let player_id = match player {
            Some(id) => {
                if !self.turn_order.contains(&id) {
                    return Err(TurnError::UnknownPlayer(id));
                }
                id
            }
            None => self.turn_order[0].clone(),
        };
        self.series.push(Turn {
            player_id,
            start: action_index,
            end: None,
        });
        Ok(())
    }

    /// Close the open turn at `action_index` (stored exclusive, as
    /// `action_index + 1`) and bump the player's turn count. Returns the
    /// player whose turn closed.
    pub fn end_turn(&mut self, action_index: u64) -> Result<PlayerId, TurnError> {
        let turn = self
            .series
            .last_mut()
            .filter(|turn| turn.is_open())
            .ok_or(TurnError::NoOpenTurn)?;
        turn.end = Some(action_index + 1);
        let player_id = turn.player_id.clone();
        *self.turn_counts.entry(player_id.clone()).or_insert(0) += 1;
        Ok(player_id)
    }

    /// Walk the rotation cyclically from `current`, skipping players the
    /// predicate rejects. Returns `current` itself when the predicate
    /// rejects every other player; the caller owns that degenerate case.
    pub fn next_player(
        &self,
        current: &PlayerId,
        predicate: impl Fn(&PlayerId) -> bool,
    ) -> Result<PlayerId, TurnError> {
        let position = self
            .turn_order
            .iter()
            .position(|id| id == current)
            .ok_or_else(|| TurnError::UnknownPlayer(current.clone()))?;

        for offset in 1..self.turn_order.len() {
            let candidate = &self.turn_order[(position + offset) % self.turn_order.len()];
            if predicate(candidate) {
                return Ok(candidate.clone());
            }
        }
        Ok(current.clone())
    }

    /// Reopen the cycle at the head of the turn order
    pub fn restart_turn_order(&mut self, action_index: u64) -> Result<(), TurnError> {
        self.start_turn(None, action_index)
    }

    /// Replace the rotation with a re-sorted one (e.g. for a bidding
    /// phase). The new order must be a permutation of the current one.
    pub fn reseed_order(&mut self, new_order: Vec<PlayerId>) -> Result<(), TurnError> {
        let mut current: Vec<&PlayerId> = self.turn_order.iter().collect();
        let mut proposed: Vec<&PlayerId> = new_order.iter().collect();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(TurnError::NotAPermutation);
        }
        self.turn_order = new_order;
        Ok(())
    }

    /// Whether some *closed* turn for `player` ended after `action_index`.
    /// Detects "has this player had a chance to react since event X".
    pub fn had_turn_since(&self, player: &PlayerId, action_index: u64) -> bool {
        self.series.iter().any(|turn| {
            turn.player_id == *player
                && matches!(turn.end, Some(end) if end > action_index)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manager() -> TurnManager {
        TurnManager::new(vec!["a".into(), "b".into(), "c".into()])
    }

    #[test]
    fn test_start_defaults_to_head() {
        let mut turns = manager();
        turns.start_turn(None, 0).unwrap();
        assert_eq!(turns.current_player(), Some(&"a".to_string()));
    }

    #[test]
    fn test_single_open_turn_invariant() {
        let mut turns = manager();
        turns.start_turn(Some("b".into()), 0).unwrap();
        let err = turns.start_turn(Some("c".into()), 1).unwrap_err();
        assert_eq!(err, TurnError::TurnAlreadyOpen("b".into()));
    }

    #[test]
    fn test_end_turn_is_exclusive_and_counts() {
        let mut turns = manager();
        turns.start_turn(None, 0).unwrap();
        let closed = turns.end_turn(4).unwrap();
        assert_eq!(closed, "a".to_string());
        assert_eq!(turns.series()[0].end, Some(5));
        assert_eq!(turns.turn_count(&"a".into()), 1);
        assert_eq!(turns.current_turn(), None);
    }

    #[test]
    fn test_end_without_open_turn_fails() {
        let mut turns = manager();
        assert_eq!(turns.end_turn(0).unwrap_err(), TurnError::NoOpenTurn);
    }

    #[test]
    fn test_unknown_player_rejected() {
        let mut turns = manager();
        let err = turns.start_turn(Some("zz".into()), 0).unwrap_err();
        assert_eq!(err, TurnError::UnknownPlayer("zz".into()));
    }

    #[test]
    fn test_next_player_cycles() {
        let turns = manager();
        assert_eq!(turns.next_player(&"a".into(), |_| true).unwrap(), "b");
        assert_eq!(turns.next_player(&"c".into(), |_| true).unwrap(), "a");
    }

    #[test]
    fn test_next_player_skips_rejected() {
        let turns = manager();
        let next = turns
            .next_player(&"a".into(), |id| id != &"b".to_string())
            .unwrap();
        assert_eq!(next, "c");
    }

    #[test]
    fn test_next_player_degenerate_returns_current() {
        let turns = manager();
        let next = turns.next_player(&"b".into(), |_| false).unwrap();
        assert_eq!(next, "b");
    }

    #[test]
    fn test_reseed_requires_permutation() {
        let mut turns = manager();
        turns
            .reseed_order(vec!["c".into(), "a".into(), "b".into()])
            .unwrap();
        assert_eq!(turns.turn_order()[0], "c");

        let err = turns
            .reseed_order(vec!["c".into(), "a".into(), "a".into()])
            .unwrap_err();
        assert_eq!(err, TurnError::NotAPermutation);
    }

    #[test]
    fn test_restart_opens_for_head() {
        let mut turns = manager();
        turns.reseed_order(vec!["b".into(), "a".into(), "c".into()]).unwrap();
        turns.restart_turn_order(7).unwrap();
        assert_eq!(turns.current_player(), Some(&"b".to_string()));
        assert_eq!(turns.current_turn().unwrap().start, 7);
    }

    #[test]
    fn test_had_turn_since_only_closed_turns() {
        let mut turns = manager();
        turns.start_turn(Some("a".into()), 0).unwrap();
        turns.end_turn(2).unwrap();
        turns.start_turn(Some("b".into()), 3).unwrap();

        // a's turn ended at 3 (exclusive), so it ended after index 1
        assert!(turns.had_turn_since(&"a".into(), 1));
        assert!(!turns.had_turn_since(&"a".into(), 3));
        // b's turn is still open and never counts
        assert!(!turns.had_turn_since(&"b".into(), 0));
    }
}
