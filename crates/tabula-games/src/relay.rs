//! Relay: a hex-grid checkpoint race.
//!
//! Runners start on the rim of a hex board and race to the center,
//! touching each checkpoint in order on the way. A move covers up to
//! `speed` steps but may not enter or cross another runner's hex. A runner
//! with no legal move is passed automatically; if nobody can move the race
//! is declared a draw. Checkpoints count only when landed on, not when
//! crossed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabula_core::{
    ActionBody, ActionKindOf, ActionRecord, ActionSource, AxialCoord, ConfigValue, Game,
    GameConfig, GameResult, GameRng, GameState, Graph, HexRing, HexSpiral, MachineContext,
    OptionDescriptor, OptionKind, PhaseHandler, PlayerId, RuleError, Seat, Setup,
};
use tracing::debug;

/// Marker type for the relay game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relay;

/// The course: board graph, ordered checkpoints, and the finish hex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayBoard {
    pub graph: Graph<AxialCoord>,
    /// Checkpoints, to be landed on in this order
    pub gates: Vec<AxialCoord>,
    pub goal: AxialCoord,
    /// Maximum steps per move, resolved from config at setup
    pub speed: u32,
}

/// One runner's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    pub position: AxialCoord,
    /// Index of the next checkpoint owed; equals `gates.len()` once all
    /// checkpoints are cleared
    pub next_gate: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelayPhase {
    Movement,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayAction {
    Move { to: AxialCoord },
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelayActionKind {
    Move,
    Pass,
}

/// Hexes a runner can end a move on: a range-limited flood that never
/// enters another runner's hex. The runner's own hex is element zero.
fn movement_range(state: &GameState<Relay>, player: &PlayerId) -> Vec<AxialCoord> {
    let Some(runner) = state.player(player) else {
        return Vec::new();
    };
    let occupied: Vec<AxialCoord> = state
        .players
        .iter()
        .filter(|p| p.id != *player)
        .map(|p| p.data.position)
        .collect();
    state.board.graph.flood(
        runner.data.position,
        Some(state.board.speed),
        |_, to| !occupied.contains(&to.coords),
    )
}

fn has_move(state: &GameState<Relay>, player: &PlayerId) -> bool {
    movement_range(state, player).len() > 1
}

impl ActionBody<Relay> for RelayAction {
    type Kind = RelayActionKind;

    fn kind(&self) -> RelayActionKind {
        match self {
            RelayAction::Move { .. } => RelayActionKind::Move,
            RelayAction::Pass => RelayActionKind::Pass,
        }
    }

    fn apply(
        &self,
        record: &ActionRecord<RelayAction>,
        state: &mut GameState<Relay>,
        _ctx: &mut MachineContext<'_, Relay>,
    ) -> Result<Value, RuleError> {
        let actor = record
            .player_id
            .clone()
            .ok_or_else(|| RuleError::new("relay actions need an acting runner"))?;
        if state.turns.current_player() != Some(&actor) {
            return Err(RuleError::new(format!("it is not {actor}'s turn")));
        }
        match self {
            RelayAction::Pass => Ok(Value::Null),
            RelayAction::Move { to } => {
                let position = state
                    .player(&actor)
                    .map(|p| p.data.position)
                    .ok_or_else(|| RuleError::new(format!("unknown runner '{actor}'")))?;
                let range = movement_range(state, &actor);
                if *to == position || !range.contains(to) {
                    return Err(RuleError::new(format!(
                        "({}, {}) is not reachable this move",
                        to.q, to.r
                    )));
                }

                let gates = state.board.gates.clone();
                let goal = state.board.goal;
                let runner = state
                    .player_mut(&actor)
                    .ok_or_else(|| RuleError::new(format!("unknown runner '{actor}'")))?;
                runner.data.position = *to;
                while runner.data.next_gate < gates.len()
                    && runner.data.position == gates[runner.data.next_gate]
                {
                    runner.data.next_gate += 1;
                }
                let cleared = runner.data.next_gate;

                if cleared == gates.len() && *to == goal {
                    state.result = Some(GameResult::Won);
                    state.winning_player_ids = vec![actor.clone()];
                    debug!(winner = %actor, "relay finished");
                }

                // Progress estimate: shortest remaining route through the
                // outstanding checkpoints, ignoring other runners
                let remaining = state
                    .board
                    .graph
                    .shortest_path(*to, goal, &gates[cleared..], |_, _| true)
                    .map(|path| path.len() - 1);
                Ok(json!({ "gatesCleared": cleared, "remaining": remaining }))
            }
        }
    }
}

struct MovementHandler;

impl MovementHandler {
    /// Pass the turn for a boxed-in runner, but only while somebody on the
    /// board can still move (otherwise the pass cascade would never stop).
    fn queue_auto_pass(&self, state: &GameState<Relay>, ctx: &mut MachineContext<'_, Relay>) {
        let Some(current) = state.turns.current_player() else {
            return;
        };
        let somebody_mobile = state.players.iter().any(|p| has_move(state, &p.id));
        if somebody_mobile && !has_move(state, current) {
            ctx.add_system_action(current.clone(), RelayAction::Pass);
        }
    }
}

impl PhaseHandler<Relay> for MovementHandler {
    fn is_valid_action(
        &self,
        state: &GameState<Relay>,
        _ctx: &MachineContext<'_, Relay>,
        action: &ActionRecord<RelayAction>,
    ) -> bool {
        let on_turn = action.player_id.as_ref() == state.turns.current_player();
        match action.source {
            ActionSource::User => on_turn,
            ActionSource::System => on_turn && action.body == RelayAction::Pass,
        }
    }

    fn valid_actions_for(
        &self,
        state: &GameState<Relay>,
        _ctx: &MachineContext<'_, Relay>,
        player: &PlayerId,
    ) -> Vec<ActionKindOf<Relay>> {
        if state.turns.current_player() != Some(player) {
            return Vec::new();
        }
        if has_move(state, player) {
            vec![RelayActionKind::Move, RelayActionKind::Pass]
        } else {
            vec![RelayActionKind::Pass]
        }
    }

    fn enter(
        &self,
        state: &mut GameState<Relay>,
        ctx: &mut MachineContext<'_, Relay>,
    ) -> Result<(), RuleError> {
        let _ = ctx;
        if state.turns.current_turn().is_none() {
            state.turns.start_turn(None, state.action_count)?;
        }
        Ok(())
    }

    fn on_action(
        &self,
        state: &mut GameState<Relay>,
        ctx: &mut MachineContext<'_, Relay>,
        action: &ActionRecord<RelayAction>,
    ) -> Result<RelayPhase, RuleError> {
        if state.is_finished() {
            return Ok(RelayPhase::Finished);
        }
        let closed = state.turns.end_turn(action.index)?;
        let next = state.turns.next_player(&closed, |_| true)?;
        state.turns.start_turn(Some(next), state.action_count)?;

        if state.players.iter().all(|p| !has_move(state, &p.id)) {
            state.result = Some(GameResult::Draw);
            debug!("no runner can move, race drawn");
            return Ok(RelayPhase::Finished);
        }
        self.queue_auto_pass(state, ctx);
        Ok(RelayPhase::Movement)
    }
}

struct FinishedHandler;

impl PhaseHandler<Relay> for FinishedHandler {
    fn is_valid_action(
        &self,
        _state: &GameState<Relay>,
        _ctx: &MachineContext<'_, Relay>,
        _action: &ActionRecord<RelayAction>,
    ) -> bool {
        false
    }

    fn valid_actions_for(
        &self,
        _state: &GameState<Relay>,
        _ctx: &MachineContext<'_, Relay>,
        _player: &PlayerId,
    ) -> Vec<ActionKindOf<Relay>> {
        Vec::new()
    }

    fn on_action(
        &self,
        _state: &mut GameState<Relay>,
        _ctx: &mut MachineContext<'_, Relay>,
        _action: &ActionRecord<RelayAction>,
    ) -> Result<RelayPhase, RuleError> {
        Err(RuleError::new("the race is over"))
    }

    fn awaiting_input(
        &self,
        _state: &GameState<Relay>,
        _ctx: &MachineContext<'_, Relay>,
    ) -> Vec<PlayerId> {
        Vec::new()
    }
}

impl Game for Relay {
    type Board = RelayBoard;
    type PlayerData = Runner;
    type Action = RelayAction;
    type Phase = RelayPhase;

    fn name() -> &'static str {
        "relay"
    }

    fn options() -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor::new(
                "radius",
                "Board radius",
                OptionKind::NumberInput { min: 2.0, max: 8.0 },
                ConfigValue::Number(3.0),
            ),
            OptionDescriptor::new(
                "speed",
                "Steps per move",
                OptionKind::NumberInput { min: 1.0, max: 6.0 },
                ConfigValue::Number(2.0),
            ),
            OptionDescriptor::new(
                "checkpoints",
                "Checkpoints",
                OptionKind::NumberInput { min: 0.0, max: 6.0 },
                ConfigValue::Number(1.0),
            ),
        ]
    }

    fn handler(phase: RelayPhase) -> &'static dyn PhaseHandler<Relay> {
        match phase {
            RelayPhase::Movement => &MovementHandler,
            RelayPhase::Finished => &FinishedHandler,
        }
    }

    fn setup(config: &GameConfig, seats: &[Seat], rng: &mut GameRng) -> Result<Setup<Relay>, RuleError> {
        let radius = config.integer_or("radius", 3).clamp(2, 8) as u32;
        let speed = config.integer_or("speed", 2).clamp(1, 6) as u32;
        let checkpoints = config.integer_or("checkpoints", 1).clamp(0, 6) as usize;

        let goal = AxialCoord::new(0, 0);
        let mut rim: Vec<AxialCoord> = HexRing::new(goal, radius).collect();
        if seats.len() > rim.len() {
            return Err(RuleError::new(format!(
                "a radius-{radius} course seats at most {} runners",
                rim.len()
            )));
        }
        rng.shuffle(&mut rim);

        let gate_ring = (radius / 2).max(1);
        let mut gate_pool: Vec<AxialCoord> = HexRing::new(goal, gate_ring).collect();
        rng.shuffle(&mut gate_pool);
        gate_pool.truncate(checkpoints.min(gate_pool.len()));

        Ok(Setup {
            board: RelayBoard {
                graph: Graph::from_coords(HexSpiral::new(goal, radius)),
                gates: gate_pool,
                goal,
                speed,
            },
            player_data: seats
                .iter()
                .zip(&rim)
                .map(|(_, start)| Runner {
                    position: *start,
                    next_gate: 0,
                })
                .collect(),
            phase: RelayPhase::Movement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use tabula_core::{Coordinate, Dispatcher};

    const GAME_ID: &str = "relay-1";

    fn seats(n: usize) -> Vec<Seat> {
        ["a", "b", "c", "d"][..n]
            .iter()
            .map(|id| Seat::new(*id, id.to_uppercase()))
            .collect()
    }

    fn new_game(
        config: GameConfig,
        players: usize,
    ) -> (
        Dispatcher<Relay>,
        GameState<Relay>,
        Vec<ActionRecord<RelayAction>>,
    ) {
        let dispatcher = Dispatcher::new(config);
        let (state, log) = dispatcher
            .create_game("state-1", GAME_ID, 11, &seats(players))
            .unwrap();
        (dispatcher, state, log)
    }

    fn place(state: &mut GameState<Relay>, player: &str, q: i32, r: i32) {
        state.player_mut(&player.to_string()).unwrap().data.position = AxialCoord::new(q, r);
    }

    fn move_to(id: &str, index: u64, player: &str, to: AxialCoord) -> Value {
        json!({
            "id": id,
            "type": "move",
            "to": { "q": to.q, "r": to.r },
            "gameId": GAME_ID,
            "playerId": player,
            "index": index,
            "source": "user",
            "revealsInfo": false,
        })
    }

    fn pass(id: &str, index: u64, player: &str) -> Value {
        json!({
            "id": id,
            "type": "pass",
            "gameId": GAME_ID,
            "playerId": player,
            "index": index,
            "source": "user",
            "revealsInfo": false,
        })
    }

    #[test]
    fn test_setup_places_runners_on_rim() {
        let (_, state, log) = new_game(GameConfig::new(), 3);

        assert!(log.is_empty());
        // Radius 3: 1 + 6 + 12 + 18 hexes
        assert_eq!(state.board.graph.len(), 37);
        assert_eq!(state.board.gates.len(), 1);
        assert_eq!(state.board.goal.hex_distance(&state.board.gates[0]), 1);

        let positions: Vec<AxialCoord> = state.players.iter().map(|p| p.data.position).collect();
        for position in &positions {
            assert_eq!(position.hex_distance(&state.board.goal), 3);
        }
        let distinct: HashSet<u64> = positions.iter().map(|p| p.node_id()).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_move_blocked_by_another_runner() {
        let config = GameConfig::new()
            .set("radius", ConfigValue::Number(2.0))
            .set("speed", ConfigValue::Number(1.0));
        let (dispatcher, mut state, mut log) = new_game(config, 3);
        place(&mut state, "a", -2, 0);
        place(&mut state, "b", -1, 0);
        place(&mut state, "c", 2, 0);

        // Bob's hex is off limits
        let err = dispatcher
            .dispatch(&mut state, &mut log, &move_to("m-0", 0, "a", AxialCoord::new(-1, 0)))
            .unwrap_err();
        assert!(matches!(err, tabula_core::EngineError::Rule(_)));

        // Sidestepping along the rim is fine
        dispatcher
            .dispatch(&mut state, &mut log, &move_to("m-0", 0, "a", AxialCoord::new(-2, 1)))
            .unwrap();
        assert_eq!(
            state.player(&"a".to_string()).unwrap().data.position,
            AxialCoord::new(-2, 1)
        );
    }

    #[test]
    fn test_checkpoint_then_goal_wins() {
        let config = GameConfig::new().set("radius", ConfigValue::Number(2.0));
        let (dispatcher, mut state, mut log) = new_game(config, 3);
        place(&mut state, "a", 2, 0);
        place(&mut state, "b", -2, 0);
        place(&mut state, "c", 0, -2);
        state.board.gates = vec![AxialCoord::new(1, 0)];

        dispatcher
            .dispatch(&mut state, &mut log, &move_to("m-0", 0, "a", AxialCoord::new(1, 0)))
            .unwrap();
        let alice = state.player(&"a".to_string()).unwrap();
        assert_eq!(alice.data.next_gate, 1);
        assert_eq!(log[0].metadata, Some(json!({ "gatesCleared": 1, "remaining": 1 })));
        assert!(!state.is_finished());

        dispatcher.dispatch(&mut state, &mut log, &pass("p-1", 1, "b")).unwrap();
        dispatcher.dispatch(&mut state, &mut log, &pass("p-2", 2, "c")).unwrap();
        let outcome = dispatcher
            .dispatch(&mut state, &mut log, &move_to("m-3", 3, "a", AxialCoord::new(0, 0)))
            .unwrap();

        assert_eq!(outcome.phase, RelayPhase::Finished);
        assert_eq!(state.result, Some(GameResult::Won));
        assert_eq!(state.winning_player_ids, vec!["a".to_string()]);
        assert!(state.active_player_ids.is_empty());
        dispatcher.verify(&state, &log).unwrap();
    }

    #[test]
    fn test_goal_without_checkpoint_does_not_win() {
        let config = GameConfig::new().set("radius", ConfigValue::Number(2.0));
        let (dispatcher, mut state, mut log) = new_game(config, 3);
        place(&mut state, "a", 2, 0);
        place(&mut state, "b", -2, 0);
        place(&mut state, "c", 0, -2);
        state.board.gates = vec![AxialCoord::new(-1, 0)];

        dispatcher
            .dispatch(&mut state, &mut log, &move_to("m-0", 0, "a", AxialCoord::new(0, 0)))
            .unwrap();

        assert!(!state.is_finished());
        assert_eq!(state.player(&"a".to_string()).unwrap().data.next_gate, 0);
    }

    #[test]
    fn test_boxed_in_runner_is_auto_passed() {
        let config = GameConfig::new()
            .set("radius", ConfigValue::Number(2.0))
            .set("speed", ConfigValue::Number(1.0));
        let (dispatcher, mut state, mut log) = new_game(config, 4);
        // Bob sits in the (2, 0) corner; its only on-board neighbors are
        // (2, -1), (1, 0), and (1, 1), all occupied
        place(&mut state, "b", 2, 0);
        place(&mut state, "a", 2, -1);
        place(&mut state, "c", 1, 0);
        place(&mut state, "d", 1, 1);

        assert!(!has_move(&state, &"b".to_string()));

        let outcome = dispatcher
            .dispatch(&mut state, &mut log, &pass("p-0", 0, "a"))
            .unwrap();

        // Bob's turn happened by itself
        assert_eq!(outcome.applied, 2);
        assert_eq!(log[1].source, ActionSource::System);
        assert_eq!(log[1].player_id, Some("b".to_string()));
        assert_eq!(log[1].body, RelayAction::Pass);
        assert_eq!(state.turns.current_player(), Some(&"c".to_string()));
        assert_eq!(state.turns.turn_count(&"b".into()), 1);
    }

    #[test]
    fn test_valid_actions_shrink_when_boxed() {
        let config = GameConfig::new()
            .set("radius", ConfigValue::Number(2.0))
            .set("speed", ConfigValue::Number(1.0));
        let (dispatcher, mut state, _) = new_game(config, 4);
        place(&mut state, "a", 2, 0);
        place(&mut state, "b", 2, -1);
        place(&mut state, "c", 1, 0);
        place(&mut state, "d", 1, 1);

        assert_eq!(
            dispatcher.valid_actions(&state, &"a".to_string()),
            vec![RelayActionKind::Pass]
        );
        assert!(dispatcher.valid_actions(&state, &"b".to_string()).is_empty());
    }
}
