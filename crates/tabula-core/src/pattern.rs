//! Procedural coordinate patterns.
//!
//! Every pattern is a lazy, finite, restartable iterator over coordinates,
//! independent of any graph: the same pattern value can populate several
//! boards. Ring and spiral walks compute a starting offset at the requested
//! radius from the orientation's direction vector table, then walk straight
//! edges (six for hexes, four for squares), advancing direction after each
//! edge. Both rotation directions and an arbitrary starting direction are
//! supported so callers can match symmetry rules at the board edge.

use crate::coords::{
    AxialCoord, HexDirection, OffsetCoord, Orientation, Rotation, SquareDirection,
};

// ==================== Lines ====================

/// Straight hex line: `length` coordinates from `origin` along a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexLine {
    origin: AxialCoord,
    direction: HexDirection,
    orientation: Orientation,
    length: u32,
    emitted: u32,
}

impl HexLine {
    pub fn new(origin: AxialCoord, direction: HexDirection, length: u32) -> Self {
        Self::oriented(origin, direction, Orientation::PointyTop, length)
    }

    pub fn oriented(
        origin: AxialCoord,
        direction: HexDirection,
        orientation: Orientation,
        length: u32,
    ) -> Self {
        Self {
            origin,
            direction,
            orientation,
            length,
            emitted: 0,
        }
    }
}

impl Iterator for HexLine {
    type Item = AxialCoord;

    fn next(&mut self) -> Option<AxialCoord> {
        if self.emitted >= self.length {
            return None;
        }
        let step = self.direction.vector(self.orientation);
        let coord = self.origin + step.scaled(self.emitted as i32);
        self.emitted += 1;
        Some(coord)
    }
}

/// Straight square line: `length` coordinates from `origin` along a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareLine {
    origin: OffsetCoord,
    direction: SquareDirection,
    length: u32,
    emitted: u32,
}

impl SquareLine {
    pub fn new(origin: OffsetCoord, direction: SquareDirection, length: u32) -> Self {
        Self {
            origin,
            direction,
            length,
            emitted: 0,
        }
    }
}

impl Iterator for SquareLine {
    type Item = OffsetCoord;

    fn next(&mut self) -> Option<OffsetCoord> {
        if self.emitted >= self.length {
            return None;
        }
        let (dr, dc) = self.direction.delta();
        let k = self.emitted as i32;
        self.emitted += 1;
        Some(OffsetCoord::new(
            self.origin.row + dr * k,
            self.origin.col + dc * k,
        ))
    }
}

// ==================== Rectangle ====================

/// Row-major rectangle of squares starting at `origin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    origin: OffsetCoord,
    width: u32,
    height: u32,
    emitted: u32,
}

impl Rectangle {
    pub fn new(origin: OffsetCoord, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
            emitted: 0,
        }
    }
}

impl Iterator for Rectangle {
    type Item = OffsetCoord;

    fn next(&mut self) -> Option<OffsetCoord> {
        if self.width == 0 || self.emitted >= self.width * self.height {
            return None;
        }
        let row = (self.emitted / self.width) as i32;
        let col = (self.emitted % self.width) as i32;
        self.emitted += 1;
        Some(OffsetCoord::new(
            self.origin.row + row,
            self.origin.col + col,
        ))
    }
}

// ==================== Hex ring / spiral ====================

/// All hexes at exactly `radius` steps from `center`, in ring order.
///
/// Starts at `center + start_direction * radius`, then walks six straight
/// edges of `radius` steps each. The first walk direction sits two ring
/// positions past the start direction; it advances one position after each
/// edge. Radius 0 yields the center alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexRing {
    center: AxialCoord,
    radius: u32,
    orientation: Orientation,
    rotation: Rotation,
    start_direction: HexDirection,
    cursor: Option<AxialCoord>,
    walk_direction: HexDirection,
    steps_on_edge: u32,
    emitted: u32,
}

impl HexRing {
    pub fn new(center: AxialCoord, radius: u32) -> Self {
        Self::custom(
            center,
            radius,
            Orientation::PointyTop,
            Rotation::CounterClockwise,
            HexDirection::East,
        )
    }

    pub fn custom(
        center: AxialCoord,
        radius: u32,
        orientation: Orientation,
        rotation: Rotation,
        start_direction: HexDirection,
    ) -> Self {
        Self {
            center,
            radius,
            orientation,
            rotation,
            start_direction,
            cursor: None,
            walk_direction: start_direction.rotated_by(rotation, 2),
            steps_on_edge: 0,
            emitted: 0,
        }
    }

    /// Number of coordinates the ring yields
    pub fn len(&self) -> u32 {
        if self.radius == 0 {
            1
        } else {
            6 * self.radius
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Iterator for HexRing {
    type Item = AxialCoord;

    fn next(&mut self) -> Option<AxialCoord> {
        if self.emitted >= self.len() {
            return None;
        }
        if self.radius == 0 {
            self.emitted = 1;
            return Some(self.center);
        }

        let current = match self.cursor {
            Some(at) => {
                // Advance one step, turning at each corner
                if self.steps_on_edge == self.radius {
                    self.walk_direction = self.walk_direction.rotated(self.rotation);
                    self.steps_on_edge = 0;
                }
                self.steps_on_edge += 1;
                at + self.walk_direction.vector(self.orientation)
            }
            None => {
                self.steps_on_edge = 0;
                self.center
                    + self
                        .start_direction
                        .vector(self.orientation)
                        .scaled(self.radius as i32)
            }
        };
        self.cursor = Some(current);
        self.emitted += 1;
        Some(current)
    }
}

/// Center plus concentric rings out to `radius`, inner rings first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexSpiral {
    center: AxialCoord,
    radius: u32,
    orientation: Orientation,
    rotation: Rotation,
    start_direction: HexDirection,
    current_radius: u32,
    ring: Option<HexRing>,
}

impl HexSpiral {
    pub fn new(center: AxialCoord, radius: u32) -> Self {
        Self::custom(
            center,
            radius,
            Orientation::PointyTop,
            Rotation::CounterClockwise,
            HexDirection::East,
        )
    }

    pub fn custom(
        center: AxialCoord,
        radius: u32,
        orientation: Orientation,
        rotation: Rotation,
        start_direction: HexDirection,
    ) -> Self {
        Self {
            center,
            radius,
            orientation,
            rotation,
            start_direction,
            current_radius: 0,
            ring: Some(HexRing::custom(
                center,
                0,
                orientation,
                rotation,
                start_direction,
            )),
        }
    }
}

impl Iterator for HexSpiral {
    type Item = AxialCoord;

    fn next(&mut self) -> Option<AxialCoord> {
        loop {
            let ring = self.ring.as_mut()?;
            if let Some(coord) = ring.next() {
                return Some(coord);
            }
            if self.current_radius >= self.radius {
                self.ring = None;
                return None;
            }
            self.current_radius += 1;
            self.ring = Some(HexRing::custom(
                self.center,
                self.current_radius,
                self.orientation,
                self.rotation,
                self.start_direction,
            ));
        }
    }
}

// ==================== Square ring / spiral ====================

/// All squares at Chebyshev distance `radius` from `center`.
///
/// Starts at the corner named by `start_corner` (a diagonal direction) and
/// walks four straight edges of `2 * radius` steps each. Radius 0 yields
/// the center alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareRing {
    center: OffsetCoord,
    radius: u32,
    rotation: Rotation,
    start_corner: SquareDirection,
    cursor: Option<OffsetCoord>,
    walk_direction: SquareDirection,
    steps_on_edge: u32,
    emitted: u32,
}

impl SquareRing {
    pub fn new(center: OffsetCoord, radius: u32) -> Self {
        Self::custom(
            center,
            radius,
            Rotation::Clockwise,
            SquareDirection::NorthWest,
        )
    }

    pub fn custom(
        center: OffsetCoord,
        radius: u32,
        rotation: Rotation,
        start_corner: SquareDirection,
    ) -> Self {
        debug_assert!(
            SquareDirection::DIAGONAL.contains(&start_corner),
            "square rings start at a corner"
        );
        Self {
            center,
            radius,
            rotation,
            start_corner,
            cursor: None,
            walk_direction: first_edge_direction(start_corner, rotation),
            steps_on_edge: 0,
            emitted: 0,
        }
    }

    /// Number of coordinates the ring yields
    pub fn len(&self) -> u32 {
        if self.radius == 0 {
            1
        } else {
            8 * self.radius
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Walk direction leaving a start corner so the ring closes after four edges
fn first_edge_direction(corner: SquareDirection, rotation: Rotation) -> SquareDirection {
    let corner_index = SquareDirection::DIAGONAL
        .iter()
        .position(|d| *d == corner)
        .unwrap_or(0);
    let offset = match rotation {
        Rotation::Clockwise => 2,
        Rotation::CounterClockwise => 3,
    };
    SquareDirection::CARDINAL[(corner_index + offset) % 4]
}

impl Iterator for SquareRing {
    type Item = OffsetCoord;

    fn next(&mut self) -> Option<OffsetCoord> {
        if self.emitted >= self.len() {
            return None;
        }
        if self.radius == 0 {
            self.emitted = 1;
            return Some(self.center);
        }

        let edge_length = 2 * self.radius;
        let current = match self.cursor {
            Some(at) => {
                if self.steps_on_edge == edge_length {
                    self.walk_direction = self.walk_direction.next_cardinal(self.rotation);
                    self.steps_on_edge = 0;
                }
                self.steps_on_edge += 1;
                at.neighbor(self.walk_direction)
            }
            None => {
                self.steps_on_edge = 0;
                let (dr, dc) = self.start_corner.delta();
                OffsetCoord::new(
                    self.center.row + dr * self.radius as i32,
                    self.center.col + dc * self.radius as i32,
                )
            }
        };
        self.cursor = Some(current);
        self.emitted += 1;
        Some(current)
    }
}

/// Center plus concentric square rings out to `radius`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareSpiral {
    center: OffsetCoord,
    radius: u32,
    rotation: Rotation,
    start_corner: SquareDirection,
    current_radius: u32,
    ring: Option<SquareRing>,
}

impl SquareSpiral {
    pub fn new(center: OffsetCoord, radius: u32) -> Self {
        Self::custom(
            center,
            radius,
            Rotation::Clockwise,
            SquareDirection::NorthWest,
        )
    }

    pub fn custom(
        center: OffsetCoord,
        radius: u32,
        rotation: Rotation,
        start_corner: SquareDirection,
    ) -> Self {
        Self {
            center,
            radius,
            rotation,
            start_corner,
            current_radius: 0,
            ring: Some(SquareRing::custom(center, 0, rotation, start_corner)),
        }
    }
}

impl Iterator for SquareSpiral {
    type Item = OffsetCoord;

    fn next(&mut self) -> Option<OffsetCoord> {
        loop {
            let ring = self.ring.as_mut()?;
            if let Some(coord) = ring.next() {
                return Some(coord);
            }
            if self.current_radius >= self.radius {
                self.ring = None;
                return None;
            }
            self.current_radius += 1;
            self.ring = Some(SquareRing::custom(
                self.center,
                self.current_radius,
                self.rotation,
                self.start_corner,
            ));
        }
    }
}
