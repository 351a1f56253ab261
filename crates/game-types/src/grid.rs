//! Grid geometry, movement directions, and the win predicate.

use serde::{Deserialize, Serialize};

/// The game is played on a square grid of this side length.
pub const GRID_SIZE: u8 = 5;

/// Win condition X coordinate (bottom-right corner).
pub const WIN_X: u8 = GRID_SIZE - 1;

/// Win condition Y coordinate (bottom-right corner).
pub const WIN_Y: u8 = GRID_SIZE - 1;

/// Player position on the grid. Coordinates are in `[0, GRID_SIZE - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u8,
    pub y: u8,
}

impl GridPos {
    /// Starting cell of a fresh session.
    pub const ORIGIN: GridPos = GridPos { x: 0, y: 0 };

    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// The single shared win predicate.
    ///
    /// `status == Won` iff the position is the bottom-right corner; every
    /// place that reconciles status against position must go through this
    /// function so restore-time and live-play corrections cannot diverge.
    pub fn is_winning(&self) -> bool {
        self.x == WIN_X && self.y == WIN_Y
    }

    /// Preview of the cell a move would land on.
    ///
    /// Returns `None` when the step would leave the grid. This is advisory
    /// only; the authoritative position always comes from the transaction
    /// receipt.
    pub fn step(&self, direction: Direction) -> Option<GridPos> {
        let (x, y) = match direction {
            Direction::Left => (self.x.checked_sub(1)?, self.y),
            Direction::Right => (self.x.checked_add(1)?, self.y),
            Direction::Up => (self.x, self.y.checked_sub(1)?),
            Direction::Down => (self.x, self.y.checked_add(1)?),
        };

        if x >= GRID_SIZE || y >= GRID_SIZE {
            return None;
        }

        Some(GridPos::new(x, y))
    }
}

/// Movement direction for the `move` system call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Wire encoding of the direction as a tagged enum value.
    ///
    /// The contract serializes the direction enum by variant index in
    /// declaration order. Treat this as a versioned wire fact; do not
    /// reorder variants.
    pub const fn wire_index(&self) -> u64 {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
            Direction::Up => 2,
            Direction::Down => 3,
        }
    }
}
