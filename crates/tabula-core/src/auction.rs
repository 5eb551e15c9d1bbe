//! Bidding protocols.
//!
//! A [`SimultaneousAuction`] requires every participant to submit exactly
//! one bid before resolving; passing is not permitted. Ties are broken
//! deterministically against a turn-order list doubled end-to-end, so the
//! tie search never special-cases wraparound.
//!
//! Auctions live on the hydration base: they travel inside game state as
//! raw records and rehydrate losslessly.

use crate::hydrate::{Hydrate, Kind, Schema};
use crate::state::PlayerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a tied high bid picks a winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TieResolution {
    /// First tied participant at or after position 0 in turn order
    FirstInOrder,
    /// Mirrored variant: last tied participant in turn order
    LastInOrder,
}

/// Bidding rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuctionError {
    #[error("player '{0}' is not an auction participant")]
    NotAParticipant(PlayerId),

    #[error("player '{0}' has already bid")]
    AlreadyBid(PlayerId),

    #[error("the auction is already resolved")]
    AlreadyResolved,

    #[error("cannot resolve before every participant has bid")]
    BidsOutstanding,
}

/// One seat in an auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub player_id: PlayerId,
    pub bid: Option<u64>,
    /// Reserved by the protocol shape; simultaneous auctions never set it
    pub passed: bool,
}

/// Simultaneous sealed-bid auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimultaneousAuction {
    participants: Vec<Participant>,
    pub high_bid: Option<u64>,
    pub winner_id: Option<PlayerId>,
    pub tie: bool,
    pub tie_resolution: TieResolution,
}

impl SimultaneousAuction {
    /// Open an auction for the given participants
    pub fn new(players: impl IntoIterator<Item = PlayerId>, tie_resolution: TieResolution) -> Self {
        let participants = players
            .into_iter()
            .map(|player_id| Participant {
                player_id,
                bid: None,
                passed: false,
            })
            .collect();
        Self {
            participants,
            high_bid: None,
            winner_id: None,
            tie: false,
            tie_resolution,
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// The bid a participant has placed, if any
    pub fn bid_of(&self, player: &PlayerId) -> Option<u64> {
        self.participants
            .iter()
            .find(|p| p.player_id == *player)
            .and_then(|p| p.bid)
    }

    /// Whether every participant has bid
    pub fn all_bids_in(&self) -> bool {
        self.participants.iter().all(|p| p.bid.is_some())
    }

    /// Whether the auction has produced a winner or an unresolved tie
    pub fn is_resolved(&self) -> bool {
        self.high_bid.is_some()
    }

    /// Record a bid. Exactly one bid per participant; a second bid, a bid
    /// from a non-participant, or a bid after resolution is an error. The
    /// final bid computes the high bid and, when untied, the winner.
    pub fn place_bid(&mut self, player: &PlayerId, amount: u64) -> Result<(), AuctionError> {
        if self.is_resolved() {
            return Err(AuctionError::AlreadyResolved);
        }
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.player_id == *player)
            .ok_or_else(|| AuctionError::NotAParticipant(player.clone()))?;
        if participant.bid.is_some() {
            return Err(AuctionError::AlreadyBid(player.clone()));
        }
        participant.bid = Some(amount);

        if self.all_bids_in() {
            self.settle();
        }
        Ok(())
    }

    /// Compute the high bid and the tie flag once the last bid lands
    fn settle(&mut self) {
        let high = self
            .participants
            .iter()
            .filter_map(|p| p.bid)
            .max()
            .unwrap_or(0);
        self.high_bid = Some(high);

        let tied: Vec<&Participant> = self
            .participants
            .iter()
            .filter(|p| p.bid == Some(high))
            .collect();
        if tied.len() == 1 {
            self.winner_id = Some(tied[0].player_id.clone());
            self.tie = false;
        } else {
            self.winner_id = None;
            self.tie = true;
        }
    }

    /// Break a tie against the given turn order. Searches the order doubled
    /// end-to-end so wraparound needs no special case. No-op when untied.
    pub fn resolve_tie(&mut self, turn_order: &[PlayerId]) -> Result<(), AuctionError> {
        if !self.all_bids_in() {
            return Err(AuctionError::BidsOutstanding);
        }
        if !self.tie || self.winner_id.is_some() {
            return Ok(());
        }

        let high = self.high_bid.unwrap_or(0);
        let tied: Vec<&PlayerId> = self
            .participants
            .iter()
            .filter(|p| p.bid == Some(high))
            .map(|p| &p.player_id)
            .collect();

        let doubled = turn_order.iter().chain(turn_order.iter());
        let mut winner: Option<PlayerId> = None;
        for candidate in doubled.take(turn_order.len()) {
            if tied.contains(&candidate) {
                winner = Some(candidate.clone());
                if self.tie_resolution == TieResolution::FirstInOrder {
                    break;
                }
            }
        }
        self.winner_id = winner;
        Ok(())
    }
}

impl Hydrate for SimultaneousAuction {
    fn schema() -> Schema {
        let participant = Schema::object("participant")
            .field("playerId", Kind::Text)
            .optional("bid", Kind::Integer)
            .field("passed", Kind::Bool);
        Schema::object("simultaneousAuction")
            .field("participants", Kind::Array(Box::new(Kind::Object(Box::new(participant)))))
            .optional("highBid", Kind::Integer)
            .optional("winnerId", Kind::Text)
            .field("tie", Kind::Bool)
            .field("tieResolution", Kind::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn players() -> Vec<PlayerId> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    fn bid_all(auction: &mut SimultaneousAuction, bids: [u64; 3]) {
        for (player, amount) in players().into_iter().zip(bids) {
            auction.place_bid(&player, amount).unwrap();
        }
    }

    #[test]
    fn test_unique_high_bid_wins() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        bid_all(&mut auction, [2, 9, 4]);
        assert_eq!(auction.high_bid, Some(9));
        assert_eq!(auction.winner_id, Some("b".to_string()));
        assert!(!auction.tie);
    }

    #[test]
    fn test_no_resolution_until_all_bids() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        auction.place_bid(&"a".into(), 5).unwrap();
        assert!(!auction.is_resolved());
        assert_eq!(
            auction.resolve_tie(&players()).unwrap_err(),
            AuctionError::BidsOutstanding
        );
    }

    #[test]
    fn test_second_bid_rejected() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        auction.place_bid(&"a".into(), 5).unwrap();
        let err = auction.place_bid(&"a".into(), 6).unwrap_err();
        assert_eq!(err, AuctionError::AlreadyBid("a".into()));
    }

    #[test]
    fn test_non_participant_rejected() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        let err = auction.place_bid(&"zz".into(), 5).unwrap_err();
        assert_eq!(err, AuctionError::NotAParticipant("zz".into()));
    }

    #[test]
    fn test_bid_after_resolution_rejected() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        bid_all(&mut auction, [1, 2, 3]);
        let err = auction.place_bid(&"a".into(), 9).unwrap_err();
        assert_eq!(err, AuctionError::AlreadyResolved);
    }

    #[test]
    fn test_tie_break_first_in_order() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        bid_all(&mut auction, [5, 5, 3]);
        assert!(auction.tie);
        assert_eq!(auction.winner_id, None);

        auction.resolve_tie(&players()).unwrap();
        assert_eq!(auction.winner_id, Some("a".to_string()));
    }

    #[test]
    fn test_tie_break_last_in_order() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::LastInOrder);
        bid_all(&mut auction, [5, 5, 3]);
        auction.resolve_tie(&players()).unwrap();
        assert_eq!(auction.winner_id, Some("b".to_string()));
    }

    #[test]
    fn test_tie_break_follows_reordered_turns() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::FirstInOrder);
        bid_all(&mut auction, [5, 5, 5]);
        auction
            .resolve_tie(&["c".into(), "b".into(), "a".into()])
            .unwrap();
        assert_eq!(auction.winner_id, Some("c".to_string()));
    }

    #[test]
    fn test_hydrate_round_trip() {
        let mut auction = SimultaneousAuction::new(players(), TieResolution::LastInOrder);
        auction.place_bid(&"a".into(), 4).unwrap();
        let raw = auction.dehydrate();
        let back = SimultaneousAuction::hydrate(&raw).unwrap();
        assert_eq!(back, auction);
        assert_eq!(back.dehydrate(), raw);
    }

    #[test]
    fn test_hydrate_rejects_malformed() {
        let raw = json!({
            "participants": [{"playerId": 1, "passed": "no"}],
            "tie": false,
            "tieResolution": "firstInOrder"
        });
        let err = SimultaneousAuction::hydrate(&raw).unwrap_err();
        assert_eq!(err.failures.len(), 2);
    }
}
