// World model: the snake, its heading and the food on a square board
//
// The model is a pure forward simulator. The live instance belongs to the
// caller's loop; planners only ever work on clones.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::error::SnakeError;
use crate::types::{Coord, Direction};

/// Smallest board the planners are specified for
pub const MIN_BOARD_SIZE: i32 = 5;

/// Length of a freshly spawned snake
pub const INITIAL_LENGTH: i32 = 3;

/// Result of advancing the snake one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub head: Coord,
    pub ate_food: bool,
}

/// Hashable snapshot of everything that matters for planning.
/// Structurally identical worlds always produce equal keys.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub body: Vec<Coord>,
    pub target: Option<Coord>,
    pub heading: Direction,
}

impl StateKey {
    pub fn head(&self) -> Coord {
        self.body[0]
    }
}

/// Complete environment snapshot
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WorldState {
    size: i32,
    body: Vec<Coord>,
    heading: Direction,
    food: Option<Coord>,
}

impl WorldState {
    /// Builds a world from caller-supplied parts, validating every invariant
    /// the planners rely on.
    pub fn new(
        size: i32,
        body: Vec<Coord>,
        heading: Direction,
        food: Option<Coord>,
    ) -> Result<Self, SnakeError> {
        if size < MIN_BOARD_SIZE {
            return Err(SnakeError::BoardTooSmall(size));
        }
        if body.len() < INITIAL_LENGTH as usize {
            return Err(SnakeError::BodyTooShort(body.len()));
        }

        let mut seen = HashSet::with_capacity(body.len());
        for (idx, cell) in body.iter().enumerate() {
            if !cell.in_bounds(size) {
                return Err(SnakeError::OutOfBounds(*cell));
            }
            if !seen.insert(*cell) {
                return Err(SnakeError::DuplicateCell(*cell));
            }
            if idx > 0 && body[idx - 1].manhattan(cell) != 1 {
                return Err(SnakeError::NotContiguous(body[idx - 1], *cell));
            }
        }

        if let Some(f) = food {
            if !f.in_bounds(size) || seen.contains(&f) {
                return Err(SnakeError::InvalidFood(f));
            }
        }

        Ok(WorldState {
            size,
            body,
            heading,
            food,
        })
    }

    /// Start-of-episode layout: a 3-cell snake facing right, head at the
    /// board centre on tiny boards and at the upper-left quarter otherwise.
    /// The anchor never sits closer to the left wall than the body is long.
    /// Food is left for the spawner.
    pub fn initial(size: i32) -> Self {
        let anchor = if size <= MIN_BOARD_SIZE {
            size / 2
        } else {
            (size / 4).max(INITIAL_LENGTH - 1)
        };
        let body = (0..INITIAL_LENGTH)
            .map(|offset| Coord::new(anchor - offset, anchor))
            .collect();

        WorldState {
            size,
            body,
            heading: Direction::Right,
            food: None,
        }
    }

    /// Rebuilds a simulation world from a planning key
    pub fn from_key(size: i32, key: &StateKey) -> Self {
        WorldState {
            size,
            body: key.body.clone(),
            heading: key.heading,
            food: key.target,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn head(&self) -> Coord {
        self.body[0]
    }

    pub fn body(&self) -> &[Coord] {
        &self.body
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn food(&self) -> Option<Coord> {
        self.food
    }

    pub fn set_food(&mut self, food: Option<Coord>) {
        self.food = food;
    }

    /// Canonical planning key for this world
    pub fn key(&self) -> StateKey {
        StateKey {
            body: self.body.clone(),
            target: self.food,
            heading: self.heading,
        }
    }

    /// Requests a new heading. A 180° reversal, or a request for `Stop`,
    /// leaves the current heading untouched.
    pub fn change_direction(&mut self, direction: Direction) {
        if direction == Direction::Stop || direction == self.heading.opposite() {
            return;
        }
        self.heading = direction;
    }

    /// Moves the head one cell along the current heading. The tail is kept
    /// when the new head lands on the food. Out-of-range heads are allowed
    /// here and reported by `check_collision`.
    pub fn advance(&mut self) -> StepOutcome {
        if self.heading == Direction::Stop {
            return StepOutcome {
                head: self.head(),
                ate_food: false,
            };
        }

        let head = self.heading.apply(&self.head());
        self.body.insert(0, head);

        let ate_food = self.food == Some(head);
        if !ate_food {
            self.body.pop();
        }

        StepOutcome { head, ate_food }
    }

    /// Applies `action` as a heading change followed by one move
    pub fn step(&mut self, action: Direction) -> StepOutcome {
        self.change_direction(action);
        self.advance()
    }

    /// Returns true if the head left the board or hit the rest of the body
    pub fn check_collision(&self) -> bool {
        let head = self.head();
        !head.in_bounds(self.size) || self.body[1..].contains(&head)
    }

    /// Every cell not covered by the snake, in row-major order
    pub fn empty_cells(&self) -> BTreeSet<Coord> {
        let occupied: HashSet<Coord> = self.body.iter().copied().collect();
        (0..self.size)
            .flat_map(|y| (0..self.size).map(move |x| Coord::new(x, y)))
            .filter(|cell| !occupied.contains(cell))
            .collect()
    }
}
