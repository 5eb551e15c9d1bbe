//! Lots: a sealed-bid auction game.
//!
//! A shuffled series of valued lots goes under the hammer. Each round every
//! player with coins submits one sealed bid; the winner pays their bid,
//! banks the lot's value, and leads the turn order into the next round.
//! Broke players are bid in automatically at zero. Highest banked value
//! when the lots run out wins.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabula_core::{
    ActionBody, ActionKindOf, ActionRecord, ActionSource, ConfigValue, Game, GameConfig,
    GameResult, GameRng, GameState, MachineContext, OptionDescriptor, OptionKind, PhaseHandler,
    PlayerId, RuleError, Seat, Setup, SimultaneousAuction, TieResolution,
};
use tracing::debug;

/// Marker type for the lots game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lots;

/// Shared auction-table state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotsBoard {
    /// Lot values in play order
    pub lots: Vec<u64>,
    /// Index of the lot currently under auction
    pub current: usize,
    /// Open auction for the current lot; `None` only once the game is over
    pub auction: Option<SimultaneousAuction>,
}

/// Per-player holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotsPlayer {
    pub coins: u64,
    pub banked: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LotsPhase {
    Bidding,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LotsAction {
    Bid { amount: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LotsActionKind {
    Bid,
}

impl ActionBody<Lots> for LotsAction {
    type Kind = LotsActionKind;

    fn kind(&self) -> LotsActionKind {
        match self {
            LotsAction::Bid { .. } => LotsActionKind::Bid,
        }
    }

    fn apply(
        &self,
        record: &ActionRecord<LotsAction>,
        state: &mut GameState<Lots>,
        _ctx: &mut MachineContext<'_, Lots>,
    ) -> Result<Value, RuleError> {
        let LotsAction::Bid { amount } = self;
        let actor = record
            .player_id
            .clone()
            .ok_or_else(|| RuleError::new("a bid needs a bidding player"))?;
        let coins = state
            .player(&actor)
            .map(|p| p.data.coins)
            .ok_or_else(|| RuleError::new(format!("unknown player '{actor}'")))?;
        if *amount > coins {
            return Err(RuleError::new(format!(
                "player '{actor}' bid {amount} with only {coins} coins"
            )));
        }

        let lot = state.board.current;
        let auction = state
            .board
            .auction
            .as_mut()
            .ok_or_else(|| RuleError::new("no lot is under auction"))?;
        auction.place_bid(&actor, *amount)?;
        let all_bids_in = auction.all_bids_in();
        Ok(json!({ "lot": lot, "allBidsIn": all_bids_in }))
    }
}

struct BiddingHandler;

impl BiddingHandler {
    /// Open the auction for the current lot and auto-bid the broke seats
    fn open_auction(&self, state: &mut GameState<Lots>, ctx: &mut MachineContext<'_, Lots>) {
        let tie_resolution = tie_resolution_for(ctx.config());
        state.board.auction = Some(SimultaneousAuction::new(
            state.player_ids(),
            tie_resolution,
        ));
        // Turn-order iteration keeps the System bid sequence deterministic
        for player in state.turns.turn_order().to_vec() {
            if state.player(&player).is_some_and(|p| p.data.coins == 0) {
                ctx.add_system_action(player, LotsAction::Bid { amount: 0 });
            }
        }
    }

    /// Settle a fully-bid auction: charge the winner, bank the lot, reseed
    /// the turn order so the winner leads, and open the next lot.
    fn resolve(
        &self,
        state: &mut GameState<Lots>,
        ctx: &mut MachineContext<'_, Lots>,
    ) -> Result<LotsPhase, RuleError> {
        let turn_order = state.turns.turn_order().to_vec();
        let auction = state
            .board
            .auction
            .as_mut()
            .ok_or_else(|| RuleError::new("no auction to resolve"))?;
        auction.resolve_tie(&turn_order)?;
        let price = auction.high_bid.unwrap_or(0);
        let winner = auction
            .winner_id
            .clone()
            .ok_or_else(|| RuleError::new("auction settled without a winner"))?;

        let value = state.board.lots[state.board.current];
        if let Some(player) = state.player_mut(&winner) {
            player.data.coins = player.data.coins.saturating_sub(price);
            player.data.banked += value;
        }
        debug!(%winner, price, value, lot = state.board.current, "lot resolved");

        // Winner leads the next round
        let lead = turn_order
            .iter()
            .position(|id| *id == winner)
            .unwrap_or(0);
        let mut reseeded = turn_order;
        reseeded.rotate_left(lead);
        state.turns.reseed_order(reseeded)?;

        state.board.current += 1;
        if state.board.current >= state.board.lots.len() {
            state.board.auction = None;
            finish(state);
            return Ok(LotsPhase::Finished);
        }
        self.open_auction(state, ctx);
        Ok(LotsPhase::Bidding)
    }
}

impl PhaseHandler<Lots> for BiddingHandler {
    fn is_valid_action(
        &self,
        state: &GameState<Lots>,
        _ctx: &MachineContext<'_, Lots>,
        action: &ActionRecord<LotsAction>,
    ) -> bool {
        let Some(actor) = action.player_id.as_ref() else {
            return false;
        };
        let Some(auction) = state.board.auction.as_ref() else {
            return false;
        };
        let awaiting = !auction.is_resolved() && auction.bid_of(actor).is_none();
        match action.source {
            ActionSource::User => awaiting,
            // The engine only bids zero, and only for broke seats
            ActionSource::System => {
                awaiting
                    && action.body == (LotsAction::Bid { amount: 0 })
                    && state.player(actor).is_some_and(|p| p.data.coins == 0)
            }
        }
    }

    fn valid_actions_for(
        &self,
        state: &GameState<Lots>,
        _ctx: &MachineContext<'_, Lots>,
        player: &PlayerId,
    ) -> Vec<ActionKindOf<Lots>> {
        match state.board.auction.as_ref() {
            Some(auction) if !auction.is_resolved() && auction.bid_of(player).is_none() => {
                vec![LotsActionKind::Bid]
            }
            _ => Vec::new(),
        }
    }

    fn enter(
        &self,
        state: &mut GameState<Lots>,
        ctx: &mut MachineContext<'_, Lots>,
    ) -> Result<(), RuleError> {
        if state.board.auction.is_none() {
            self.open_auction(state, ctx);
        }
        Ok(())
    }

    fn on_action(
        &self,
        state: &mut GameState<Lots>,
        ctx: &mut MachineContext<'_, Lots>,
        _action: &ActionRecord<LotsAction>,
    ) -> Result<LotsPhase, RuleError> {
        let all_in = state
            .board
            .auction
            .as_ref()
            .is_some_and(|a| a.all_bids_in());
        if all_in {
            return self.resolve(state, ctx);
        }
        Ok(LotsPhase::Bidding)
    }

    /// Everyone who still owes a bid, in turn order
    fn awaiting_input(
        &self,
        state: &GameState<Lots>,
        _ctx: &MachineContext<'_, Lots>,
    ) -> Vec<PlayerId> {
        let Some(auction) = state.board.auction.as_ref() else {
            return Vec::new();
        };
        if auction.is_resolved() {
            return Vec::new();
        }
        state
            .turns
            .turn_order()
            .iter()
            .filter(|id| auction.bid_of(id).is_none())
            .cloned()
            .collect()
    }
}

struct FinishedHandler;

impl PhaseHandler<Lots> for FinishedHandler {
    fn is_valid_action(
        &self,
        _state: &GameState<Lots>,
        _ctx: &MachineContext<'_, Lots>,
        _action: &ActionRecord<LotsAction>,
    ) -> bool {
        false
    }

    fn valid_actions_for(
        &self,
        _state: &GameState<Lots>,
        _ctx: &MachineContext<'_, Lots>,
        _player: &PlayerId,
    ) -> Vec<ActionKindOf<Lots>> {
        Vec::new()
    }

    fn on_action(
        &self,
        _state: &mut GameState<Lots>,
        _ctx: &mut MachineContext<'_, Lots>,
        _action: &ActionRecord<LotsAction>,
    ) -> Result<LotsPhase, RuleError> {
        Err(RuleError::new("the lots are sold"))
    }

    fn awaiting_input(
        &self,
        _state: &GameState<Lots>,
        _ctx: &MachineContext<'_, Lots>,
    ) -> Vec<PlayerId> {
        Vec::new()
    }
}

/// Highest banked value wins; ties share the win
fn finish(state: &mut GameState<Lots>) {
    let best = state
        .players
        .iter()
        .map(|p| p.data.banked)
        .max()
        .unwrap_or(0);
    state.winning_player_ids = state
        .players
        .iter()
        .filter(|p| p.data.banked == best)
        .map(|p| p.id.clone())
        .collect();
    state.result = Some(GameResult::Won);
}

fn tie_resolution_for(config: &GameConfig) -> TieResolution {
    match config.text_or("tieResolution", "firstInOrder") {
        "lastInOrder" => TieResolution::LastInOrder,
        _ => TieResolution::FirstInOrder,
    }
}

impl Game for Lots {
    type Board = LotsBoard;
    type PlayerData = LotsPlayer;
    type Action = LotsAction;
    type Phase = LotsPhase;

    fn name() -> &'static str {
        "lots"
    }

    fn options() -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor::new(
                "lotCount",
                "Number of lots",
                OptionKind::NumberInput { min: 1.0, max: 20.0 },
                ConfigValue::Number(5.0),
            ),
            OptionDescriptor::new(
                "startingCoins",
                "Starting coins",
                OptionKind::NumberInput { min: 0.0, max: 100.0 },
                ConfigValue::Number(20.0),
            ),
            OptionDescriptor::new(
                "tieResolution",
                "Tie resolution",
                OptionKind::Choice {
                    choices: vec!["firstInOrder".into(), "lastInOrder".into()],
                },
                ConfigValue::Text("firstInOrder".into()),
            ),
        ]
    }

    fn handler(phase: LotsPhase) -> &'static dyn PhaseHandler<Lots> {
        match phase {
            LotsPhase::Bidding => &BiddingHandler,
            LotsPhase::Finished => &FinishedHandler,
        }
    }

    fn setup(config: &GameConfig, seats: &[Seat], rng: &mut GameRng) -> Result<Setup<Lots>, RuleError> {
        if seats.len() < 2 {
            return Err(RuleError::new("lots needs at least two players"));
        }
        let count = config.integer_or("lotCount", 5).max(1) as u64;
        let coins = config.integer_or("startingCoins", 20).max(0) as u64;

        let mut lots: Vec<u64> = (1..=count).collect();
        rng.shuffle(&mut lots);

        Ok(Setup {
            board: LotsBoard {
                lots,
                current: 0,
                auction: None,
            },
            player_data: seats.iter().map(|_| LotsPlayer { coins, banked: 0 }).collect(),
            phase: LotsPhase::Bidding,
        })
    }
}
