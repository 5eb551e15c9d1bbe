//! Board graph: node storage, adjacency, and traversal.
//!
//! A [`Graph`] owns nodes keyed by the coordinate pairing id and is the sole
//! authority on adjacency: two nodes are neighbors only if the graph linked
//! them at insertion. Patterns generate coordinates; the graph decides which
//! of them exist and how they connect.
//!
//! Two traversals cover the engine's needs:
//! - [`Graph::flood`]: range-limited, predicate-gated reachability (movement
//!   range, cut-off detection, reachable squares)
//! - [`Graph::shortest_path`]: breadth-first shortest path threading an
//!   ordered list of required waypoints ("gates") before the destination

use crate::coords::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// A node in the board graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridNode<C> {
    /// Where the node sits
    pub coords: C,
    /// Node ids of linked neighbors
    pub neighbors: Vec<u64>,
}

/// Adjacency-owning collection of grid nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Graph<C: Coordinate> {
    nodes: HashMap<u64, GridNode<C>>,
}

impl<C: Coordinate> Graph<C> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Build a graph from any coordinate pattern using the coordinate
    /// family's default adjacency.
    pub fn from_coords(coords: impl IntoIterator<Item = C>) -> Self {
        Self::from_coords_with(coords, |c| c.adjacent())
    }

    /// Build a graph with a custom adjacency rule (e.g. 8-neighbor squares).
    pub fn from_coords_with(
        coords: impl IntoIterator<Item = C>,
        adjacency: impl Fn(&C) -> Vec<C>,
    ) -> Self {
        let mut graph = Self::new();
        for coord in coords {
            graph.insert_with(coord, &adjacency);
        }
        graph
    }

    /// Insert a node and link it (both directions) to any already-present
    /// neighbor under the default adjacency. Re-inserting is a no-op.
    pub fn insert(&mut self, coord: C) {
        self.insert_with(coord, &|c: &C| c.adjacent());
    }

    fn insert_with(&mut self, coord: C, adjacency: &impl Fn(&C) -> Vec<C>) {
        let id = coord.node_id();
        if self.nodes.contains_key(&id) {
            return;
        }

        let mut neighbors = Vec::new();
        for other in adjacency(&coord) {
            let other_id = other.node_id();
            if let Some(existing) = self.nodes.get_mut(&other_id) {
                existing.neighbors.push(id);
                neighbors.push(other_id);
            }
        }
        self.nodes.insert(id, GridNode { coords: coord, neighbors });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, coord: &C) -> bool {
        self.nodes.contains_key(&coord.node_id())
    }

    pub fn get(&self, coord: &C) -> Option<&GridNode<C>> {
        self.nodes.get(&coord.node_id())
    }

    fn get_by_id(&self, id: u64) -> Option<&GridNode<C>> {
        self.nodes.get(&id)
    }

    /// All nodes, in unspecified order
    pub fn nodes(&self) -> impl Iterator<Item = &GridNode<C>> {
        self.nodes.values()
    }

    /// Linked neighbors of a coordinate
    pub fn neighbors(&self, coord: &C) -> Vec<&GridNode<C>> {
        match self.get(coord) {
            Some(node) => node
                .neighbors
                .iter()
                .filter_map(|id| self.get_by_id(*id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The linked neighbor sitting at `target`, if the edge exists
    pub fn neighbor_at(&self, coord: &C, target: &C) -> Option<&GridNode<C>> {
        let node = self.get(coord)?;
        let target_id = target.node_id();
        if node.neighbors.contains(&target_id) {
            self.get_by_id(target_id)
        } else {
            None
        }
    }

    /// Breadth-first reachability from `start`.
    ///
    /// Visits every node reachable within `range` steps (unbounded when
    /// `None`), crossing only edges for which `can_traverse(from, to)`
    /// holds. The start node is always included. Returns coordinates in
    /// visit (breadth) order.
    pub fn flood(
        &self,
        start: C,
        range: Option<u32>,
        can_traverse: impl Fn(&GridNode<C>, &GridNode<C>) -> bool,
    ) -> Vec<C> {
        let start_node = match self.get(&start) {
            Some(node) => node,
            None => return Vec::new(),
        };

        let mut visited: HashSet<u64> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<(u64, u32)> = VecDeque::new();

        visited.insert(start_node.coords.node_id());
        order.push(start_node.coords);
        queue.push_back((start_node.coords.node_id(), 0));

        while let Some((id, depth)) = queue.pop_front() {
            if let Some(limit) = range {
                if depth >= limit {
                    continue;
                }
            }
            let node = match self.get_by_id(id) {
                Some(n) => n,
                None => continue,
            };
            for neighbor_id in &node.neighbors {
                if visited.contains(neighbor_id) {
                    continue;
                }
                let neighbor = match self.get_by_id(*neighbor_id) {
                    Some(n) => n,
                    None => continue,
                };
                if !can_traverse(node, neighbor) {
                    continue;
                }
                visited.insert(*neighbor_id);
                order.push(neighbor.coords);
                queue.push_back((*neighbor_id, depth + 1));
            }
        }

        order
    }

    /// Shortest path from `start` to `goal` crossing each gate in order.
    ///
    /// Gates are required intermediate waypoints: the path must reach
    /// `gates[0]`, then `gates[1]`, and so on, before the destination. With
    /// no gates this is a plain breadth-first shortest path. Returns the
    /// full coordinate sequence including both endpoints, or `None` when any
    /// leg is unreachable.
    pub fn shortest_path(
        &self,
        start: C,
        goal: C,
        gates: &[C],
        can_traverse: impl Fn(&GridNode<C>, &GridNode<C>) -> bool,
    ) -> Option<Vec<C>> {
        let mut path = vec![start];
        let mut at = start;

        for waypoint in gates.iter().chain(std::iter::once(&goal)) {
            let leg = self.bfs_leg(at, *waypoint, &can_traverse)?;
            // Skip the shared junction node
            path.extend(leg.into_iter().skip(1));
            at = *waypoint;
        }

        Some(path)
    }

    fn bfs_leg(
        &self,
        start: C,
        goal: C,
        can_traverse: &impl Fn(&GridNode<C>, &GridNode<C>) -> bool,
    ) -> Option<Vec<C>> {
        if !self.contains(&start) || !self.contains(&goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let goal_id = goal.node_id();
        let mut came_from: HashMap<u64, u64> = HashMap::new();
        let mut queue = VecDeque::new();
        came_from.insert(start.node_id(), start.node_id());
        queue.push_back(start.node_id());

        while let Some(id) = queue.pop_front() {
            let node = self.get_by_id(id)?;
            for neighbor_id in &node.neighbors {
                if came_from.contains_key(neighbor_id) {
                    continue;
                }
                let neighbor = match self.get_by_id(*neighbor_id) {
                    Some(n) => n,
                    None => continue,
                };
                if !can_traverse(node, neighbor) {
                    continue;
                }
                came_from.insert(*neighbor_id, id);
                if *neighbor_id == goal_id {
                    return Some(self.unwind(&came_from, start.node_id(), goal_id));
                }
                queue.push_back(*neighbor_id);
            }
        }

        None
    }

    fn unwind(&self, came_from: &HashMap<u64, u64>, start_id: u64, goal_id: u64) -> Vec<C> {
        let mut ids = vec![goal_id];
        let mut at = goal_id;
        while at != start_id {
            at = came_from[&at];
            ids.push(at);
        }
        ids.reverse();
        ids.iter()
            .filter_map(|id| self.get_by_id(*id))
            .map(|node| node.coords)
            .collect()
    }
}
