// Grid primitives shared by the world model and every planner
//
// Coordinates are screen-style: x grows to the right, y grows downward,
// so moving Up decreases y.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D cell on the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Returns true if the cell lies inside a `size` x `size` board
    pub fn in_bounds(&self, size: i32) -> bool {
        self.x >= 0 && self.x < size && self.y >= 0 && self.y < size
    }

    /// Manhattan distance, the true move count on an empty 4-connected grid
    pub fn manhattan(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Straight-line distance, used as the search heuristic
    pub fn euclidean(&self, other: &Coord) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Heading of the snake. `Stop` is only the sentinel used before the first
/// move and as the root marker of a search path.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// The four movement directions in successor-generation order
    pub fn moves() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Right, Direction::Left]
    }

    /// Stable numeric label; also the slot of this action in a Q-table row
    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::Stop => 4,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Stop => Direction::Stop,
        }
    }

    /// Directions the snake may take next: everything except a 180° turn.
    /// Before the first move every direction is allowed.
    pub fn legal_successors(&self) -> Vec<Direction> {
        match self {
            Direction::Up => vec![Direction::Up, Direction::Left, Direction::Right],
            Direction::Down => vec![Direction::Down, Direction::Left, Direction::Right],
            Direction::Left => vec![Direction::Left, Direction::Down, Direction::Up],
            Direction::Right => vec![Direction::Right, Direction::Down, Direction::Up],
            Direction::Stop => Direction::moves().to_vec(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => Coord { x: coord.x, y: coord.y - 1 },
            Direction::Down => Coord { x: coord.x, y: coord.y + 1 },
            Direction::Left => Coord { x: coord.x - 1, y: coord.y },
            Direction::Right => Coord { x: coord.x + 1, y: coord.y },
            Direction::Stop => *coord,
        }
    }
}
