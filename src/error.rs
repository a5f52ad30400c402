// Error types for the boundary of the crate
//
// Planning code never fails; these only surface when a caller hands in a
// malformed world or when the Q-table file cannot be written.

use thiserror::Error;

use crate::types::Coord;

#[derive(Debug, Error)]
pub enum SnakeError {
    #[error("board size {0} is too small (minimum is {min})", min = crate::world::MIN_BOARD_SIZE)]
    BoardTooSmall(i32),

    #[error("snake body has {0} cells, at least 3 are required")]
    BodyTooShort(usize),

    #[error("snake cell {0} lies outside the board")]
    OutOfBounds(Coord),

    #[error("snake cells {0} and {1} are not adjacent")]
    NotContiguous(Coord, Coord),

    #[error("snake occupies {0} more than once")]
    DuplicateCell(Coord),

    #[error("food at {0} overlaps the snake or lies off the board")]
    InvalidFood(Coord),

    #[error("Q-table was saved for a {found}x{found} board, expected {expected}x{expected}")]
    BoardSizeMismatch { expected: i32, found: i32 },

    #[error("failed to access Q-table file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode Q-table: {0}")]
    Serialization(#[from] serde_json::Error),
}
