//! Coordinate systems for square and hex boards.
//!
//! Two coordinate families:
//! - [`OffsetCoord`]: square grid (row/col), 4- or 8-neighbor adjacency
//! - [`AxialCoord`]: hex grid (q/r), 6-neighbor adjacency, pointy- or
//!   flat-top orientation
//!
//! Both map to a single collision-free integer id through a pairing
//! function, which is how graphs key their nodes. Direction enums carry the
//! per-orientation vector tables the pattern generators walk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::ops::Add;

/// Rotation direction for ring and spiral walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Hex orientation: which way the points face.
///
/// Orientation selects the direction vector table, so the same named
/// direction walks a different edge on pointy- and flat-top boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    #[default]
    PointyTop,
    FlatTop,
}

/// A coordinate that can live in a [`Graph`](crate::graph::Graph).
pub trait Coordinate: Copy + Eq + Hash + fmt::Debug {
    /// Collision-free integer id (pairing function over the two components)
    fn node_id(&self) -> u64;

    /// Default adjacency (4-neighbor for squares, 6-neighbor for hexes)
    fn adjacent(&self) -> Vec<Self>;

    /// Grid distance in steps under the default adjacency
    fn distance_to(&self, other: &Self) -> u32;
}

/// Zigzag-encode a signed component so negatives pack small
fn zigzag(v: i32) -> u64 {
    (v.wrapping_shl(1) ^ (v >> 31)) as u32 as u64
}

/// Pack two signed components into one collision-free u64 id
pub fn pair(a: i32, b: i32) -> u64 {
    (zigzag(a) << 32) | zigzag(b)
}

// ==================== Square grid ====================

/// Compass direction on a square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SquareDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl SquareDirection {
    /// All eight directions in clockwise ring order starting from North
    pub const ALL: [SquareDirection; 8] = [
        SquareDirection::North,
        SquareDirection::NorthEast,
        SquareDirection::East,
        SquareDirection::SouthEast,
        SquareDirection::South,
        SquareDirection::SouthWest,
        SquareDirection::West,
        SquareDirection::NorthWest,
    ];

    /// The four cardinal directions in clockwise order
    pub const CARDINAL: [SquareDirection; 4] = [
        SquareDirection::North,
        SquareDirection::East,
        SquareDirection::South,
        SquareDirection::West,
    ];

    /// The four diagonal directions in clockwise order
    pub const DIAGONAL: [SquareDirection; 4] = [
        SquareDirection::NorthEast,
        SquareDirection::SouthEast,
        SquareDirection::SouthWest,
        SquareDirection::NorthWest,
    ];

    /// Row/col delta for one step (rows grow southward)
    pub fn delta(self) -> (i32, i32) {
        match self {
            SquareDirection::North => (-1, 0),
            SquareDirection::NorthEast => (-1, 1),
            SquareDirection::East => (0, 1),
            SquareDirection::SouthEast => (1, 1),
            SquareDirection::South => (1, 0),
            SquareDirection::SouthWest => (1, -1),
            SquareDirection::West => (0, -1),
            SquareDirection::NorthWest => (-1, -1),
        }
    }

    /// Next cardinal direction in the given rotation
    pub fn next_cardinal(self, rotation: Rotation) -> SquareDirection {
        let index = Self::CARDINAL
            .iter()
            .position(|d| *d == self)
            .unwrap_or(0);
        let step: i32 = match rotation {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => -1,
        };
        Self::CARDINAL[(index as i32 + step).rem_euclid(4) as usize]
    }
}

/// Offset (row/col) coordinate on a square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OffsetCoord {
    pub row: i32,
    pub col: i32,
}

impl OffsetCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// One step in the given direction
    pub fn neighbor(&self, direction: SquareDirection) -> OffsetCoord {
        let (dr, dc) = direction.delta();
        OffsetCoord::new(self.row + dr, self.col + dc)
    }

    /// The four orthogonal neighbors
    pub fn neighbors4(&self) -> [OffsetCoord; 4] {
        SquareDirection::CARDINAL.map(|d| self.neighbor(d))
    }

    /// All eight surrounding squares
    pub fn neighbors8(&self) -> [OffsetCoord; 8] {
        SquareDirection::ALL.map(|d| self.neighbor(d))
    }

    /// Orthogonal (Manhattan) distance
    pub fn manhattan_distance(&self, other: &OffsetCoord) -> u32 {
        ((self.row - other.row).abs() + (self.col - other.col).abs()) as u32
    }

    /// King-move (Chebyshev) distance
    pub fn chebyshev_distance(&self, other: &OffsetCoord) -> u32 {
        (self.row - other.row)
            .abs()
            .max((self.col - other.col).abs()) as u32
    }
}

impl Coordinate for OffsetCoord {
    fn node_id(&self) -> u64 {
        pair(self.row, self.col)
    }

    fn adjacent(&self) -> Vec<Self> {
        self.neighbors4().to_vec()
    }

    fn distance_to(&self, other: &Self) -> u32 {
        self.manhattan_distance(other)
    }
}

// ==================== Hex grid ====================

/// The six hex directions in counter-clockwise ring order starting from East.
///
/// Names follow the pointy-top reading; on a flat-top board the same variant
/// walks the table-rotated edge (see [`HexDirection::vector`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// All six directions in counter-clockwise ring order
    pub const ALL: [HexDirection; 6] = [
        HexDirection::East,
        HexDirection::NorthEast,
        HexDirection::NorthWest,
        HexDirection::West,
        HexDirection::SouthWest,
        HexDirection::SouthEast,
    ];

    /// Axial step vector under the given orientation.
    ///
    /// The flat-top table is the pointy-top table rotated by one edge, which
    /// is what keeps ring walks starting on the expected side for both
    /// orientations.
    pub fn vector(self, orientation: Orientation) -> AxialCoord {
        let index = self.index();
        let table_index = match orientation {
            Orientation::PointyTop => index,
            Orientation::FlatTop => (index + 1) % 6,
        };
        AXIAL_VECTORS[table_index]
    }

    fn index(self) -> usize {
        match self {
            HexDirection::East => 0,
            HexDirection::NorthEast => 1,
            HexDirection::NorthWest => 2,
            HexDirection::West => 3,
            HexDirection::SouthWest => 4,
            HexDirection::SouthEast => 5,
        }
    }

    /// Step to an adjacent direction in ring order
    pub fn rotated(self, rotation: Rotation) -> HexDirection {
        self.rotated_by(rotation, 1)
    }

    /// Step several positions in ring order
    pub fn rotated_by(self, rotation: Rotation, steps: usize) -> HexDirection {
        let step: i32 = match rotation {
            // ALL is in counter-clockwise order
            Rotation::CounterClockwise => 1,
            Rotation::Clockwise => -1,
        };
        let index = (self.index() as i32 + step * steps as i32).rem_euclid(6);
        Self::ALL[index as usize]
    }
}

/// Axial step vectors in counter-clockwise ring order starting from East
const AXIAL_VECTORS: [AxialCoord; 6] = [
    AxialCoord::new(1, 0),   // East
    AxialCoord::new(1, -1),  // NorthEast
    AxialCoord::new(0, -1),  // NorthWest
    AxialCoord::new(-1, 0),  // West
    AxialCoord::new(-1, 1),  // SouthWest
    AxialCoord::new(0, 1),   // SouthEast
];

/// Axial coordinate on a hex grid.
///
/// The implicit third cube coordinate satisfies `q + r + s = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AxialCoord {
    pub q: i32,
    pub r: i32,
}

impl AxialCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third cube coordinate
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// One step in the given direction (pointy-top table)
    pub fn neighbor(&self, direction: HexDirection) -> AxialCoord {
        *self + direction.vector(Orientation::PointyTop)
    }

    /// One step in the given direction under an explicit orientation
    pub fn neighbor_oriented(&self, direction: HexDirection, orientation: Orientation) -> AxialCoord {
        *self + direction.vector(orientation)
    }

    /// The six neighboring hexes in ring order
    pub fn neighbors(&self) -> [AxialCoord; 6] {
        HexDirection::ALL.map(|d| self.neighbor(d))
    }

    /// Hex distance in steps
    pub fn hex_distance(&self, other: &AxialCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Scale the coordinate as a vector
    pub const fn scaled(&self, factor: i32) -> AxialCoord {
        AxialCoord::new(self.q * factor, self.r * factor)
    }
}

impl Add for AxialCoord {
    type Output = AxialCoord;

    fn add(self, rhs: AxialCoord) -> AxialCoord {
        AxialCoord::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Coordinate for AxialCoord {
    fn node_id(&self) -> u64 {
        pair(self.q, self.r)
    }

    fn adjacent(&self) -> Vec<Self> {
        self.neighbors().to_vec()
    }

    fn distance_to(&self, other: &Self) -> u32 {
        self.hex_distance(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors_unique_and_adjacent() {
        let center = AxialCoord::new(0, 0);
        let neighbors = center.neighbors();
        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);
        for n in &neighbors {
            assert_eq!(center.hex_distance(n), 1);
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = AxialCoord::new(0, 0);
        assert_eq!(a.hex_distance(&AxialCoord::new(2, -1)), 2);
        assert_eq!(a.hex_distance(&AxialCoord::new(-3, 3)), 3);
    }

    #[test]
    fn test_square_neighbors() {
        let c = OffsetCoord::new(0, 0);
        assert_eq!(c.neighbors4().len(), 4);
        let unique: HashSet<_> = c.neighbors8().iter().copied().collect();
        assert_eq!(unique.len(), 8);
        for n in c.neighbors4() {
            assert_eq!(c.manhattan_distance(&n), 1);
        }
        for n in c.neighbors8() {
            assert_eq!(c.chebyshev_distance(&n), 1);
        }
    }

    #[test]
    fn test_direction_rotation_cycles() {
        let mut dir = HexDirection::East;
        for _ in 0..6 {
            dir = dir.rotated(Rotation::Clockwise);
        }
        assert_eq!(dir, HexDirection::East);
        assert_eq!(
            HexDirection::East.rotated(Rotation::CounterClockwise),
            HexDirection::NorthEast
        );
        assert_eq!(
            SquareDirection::North.next_cardinal(Rotation::Clockwise),
            SquareDirection::East
        );
    }

    #[test]
    fn test_orientation_tables_rotate() {
        // Flat-top walks the next edge over for the same named direction
        assert_eq!(
            HexDirection::East.vector(Orientation::FlatTop),
            HexDirection::NorthEast.vector(Orientation::PointyTop)
        );
    }

    #[test]
    fn test_direction_vectors_sum_to_zero() {
        let total = HexDirection::ALL
            .iter()
            .fold(AxialCoord::default(), |acc, d| {
                acc + d.vector(Orientation::PointyTop)
            });
        assert_eq!(total, AxialCoord::new(0, 0));
    }

    proptest! {
        #[test]
        fn prop_pairing_injective(a: i32, b: i32, c: i32, d: i32) {
            prop_assume!((a, b) != (c, d));
            prop_assert_ne!(pair(a, b), pair(c, d));
        }

        #[test]
        fn prop_node_id_is_component_determined(q in -1000i32..1000, r in -1000i32..1000) {
            // Ids depend only on the two components, regardless of family
            let hex = AxialCoord::new(q, r);
            let square = OffsetCoord::new(q, r);
            prop_assert_eq!(hex.node_id(), square.node_id());
        }
    }
}
