// Search problems: turn a world snapshot into successor states for planning
//
// A problem captures the snake body when it is built (or reset). Successors
// for a path are derived by replaying the path's actions against that
// captured body, so no live state is ever touched during search.

use crate::types::{Coord, Direction};
use crate::world::WorldState;

/// One legal expansion of a search path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Successor {
    pub head: Coord,
    pub action: Direction,
    pub cost: u32,
}

/// Capability set shared by every planning problem
pub trait Problem {
    /// Head cell the search starts from
    fn start(&self) -> Coord;

    /// Successors of the path described by `actions`. Moves that leave the
    /// board or run into the body are dropped; the list may be empty.
    fn successors(&self, actions: &[Direction]) -> Vec<Successor>;

    fn is_goal(&self, head: Coord) -> bool;

    /// Cell the heuristic measures towards, if any
    fn goal(&self) -> Option<Coord>;

    /// Re-roots the problem at a new world snapshot
    fn reset(&mut self, world: &WorldState);
}

/// Body, board size and food captured from a world snapshot
#[derive(Debug, Clone)]
struct Snapshot {
    size: i32,
    body: Vec<Coord>,
    food: Option<Coord>,
}

impl Snapshot {
    fn capture(world: &WorldState) -> Self {
        Snapshot {
            size: world.size(),
            body: world.body().to_vec(),
            food: world.food(),
        }
    }

    /// Hypothetical body after following `actions`. The body never grows
    /// during replay; `Stop` markers are skipped.
    fn replay(&self, actions: &[Direction]) -> Vec<Coord> {
        let mut body = self.body.clone();
        for action in actions.iter().filter(|a| **a != Direction::Stop) {
            let head = action.apply(&body[0]);
            body.insert(0, head);
            body.pop();
        }
        body
    }

    fn successors(&self, actions: &[Direction]) -> Vec<Successor> {
        let body = self.replay(actions);

        Direction::moves()
            .iter()
            .filter_map(|&action| {
                let head = action.apply(&body[0]);
                if !head.in_bounds(self.size) {
                    return None;
                }

                // The tail only vacates its cell when no food is eaten
                let keep = if self.food == Some(head) {
                    body.len()
                } else {
                    body.len() - 1
                };
                if body[..keep].contains(&head) {
                    return None;
                }

                Some(Successor {
                    head,
                    action,
                    cost: 1,
                })
            })
            .collect()
    }
}

/// Goal: put the head on the food
#[derive(Debug, Clone)]
pub struct ReachFood {
    snapshot: Snapshot,
}

impl ReachFood {
    pub fn new(world: &WorldState) -> Self {
        ReachFood {
            snapshot: Snapshot::capture(world),
        }
    }
}

impl Problem for ReachFood {
    fn start(&self) -> Coord {
        self.snapshot.body[0]
    }

    fn successors(&self, actions: &[Direction]) -> Vec<Successor> {
        self.snapshot.successors(actions)
    }

    fn is_goal(&self, head: Coord) -> bool {
        self.snapshot.food == Some(head)
    }

    fn goal(&self) -> Option<Coord> {
        self.snapshot.food
    }

    fn reset(&mut self, world: &WorldState) {
        self.snapshot = Snapshot::capture(world);
    }
}

/// Goal: put the head on the current patrol target. Each reset advances
/// to the next target of a fixed boustrophedon tour.
#[derive(Debug, Clone)]
pub struct ReachTarget {
    snapshot: Snapshot,
    target: Coord,
    targets: Vec<Coord>,
    index: usize,
}

impl ReachTarget {
    pub fn new(world: &WorldState) -> Self {
        ReachTarget {
            snapshot: Snapshot::capture(world),
            target: Coord::new(world.head().x, 0),
            targets: patrol_targets(world.size() - 1),
            index: 0,
        }
    }

    pub fn target(&self) -> Coord {
        self.target
    }

    pub fn targets(&self) -> &[Coord] {
        &self.targets
    }
}

impl Problem for ReachTarget {
    fn start(&self) -> Coord {
        self.snapshot.body[0]
    }

    fn successors(&self, actions: &[Direction]) -> Vec<Successor> {
        self.snapshot.successors(actions)
    }

    fn is_goal(&self, head: Coord) -> bool {
        head == self.target
    }

    fn goal(&self) -> Option<Coord> {
        Some(self.target)
    }

    fn reset(&mut self, world: &WorldState) {
        self.snapshot = Snapshot::capture(world);
        self.target = self.targets[self.index];
        self.index = (self.index + 1) % self.targets.len();
    }
}

/// Patrol tour for a board whose last index is `n`.
///
/// Starts at (0, 0), then sweeps every row 1..=n back and forth between
/// column 0 and column n - 1, leaving column n free as the return lane.
/// The last row always finishes in column n before climbing back to (n, 0),
/// so the tour closes into a cycle for both board parities.
pub fn patrol_targets(n: i32) -> Vec<Coord> {
    let mut targets = vec![Coord::new(0, 0)];
    let mut from_left = true;

    for row in 1..=n {
        if row == n {
            if from_left {
                targets.push(Coord::new(0, row));
            } else {
                targets.push(Coord::new(n - 1, row));
            }
            targets.push(Coord::new(n, row));
            targets.push(Coord::new(n, 0));
        } else if from_left {
            targets.push(Coord::new(0, row));
            targets.push(Coord::new(n - 1, row));
        } else {
            targets.push(Coord::new(n - 1, row));
            targets.push(Coord::new(0, row));
        }
        from_left = !from_left;
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn straight_world() -> WorldState {
        WorldState::new(
            10,
            vec![Coord::new(4, 4), Coord::new(3, 4), Coord::new(2, 4)],
            Direction::Right,
            Some(Coord::new(8, 8)),
        )
        .unwrap()
    }

    #[test]
    fn test_straight_snake_has_three_successors() {
        let problem = ReachFood::new(&straight_world());
        let successors = problem.successors(&[]);

        assert_eq!(successors.len(), 3);
        assert!(successors.iter().all(|s| s.cost == 1));
        assert!(
            !successors.iter().any(|s| s.action == Direction::Left),
            "reversing into the neck is a self-collision"
        );
    }

    #[test]
    fn test_successors_drop_off_board_moves() {
        let world = WorldState::new(
            10,
            vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)],
            Direction::Left,
            None,
        )
        .unwrap();
        let problem = ReachFood::new(&world);
        let successors = problem.successors(&[]);

        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].action, Direction::Down);
        assert_eq!(successors[0].head, Coord::new(0, 1));
    }

    #[test]
    fn test_successors_follow_replayed_actions() {
        let problem = ReachFood::new(&straight_world());
        let successors = problem.successors(&[Direction::Stop, Direction::Down, Direction::Down]);

        // Head at (4,6) heading down; body (4,6),(4,5),(4,4)
        let heads: HashSet<Coord> = successors.iter().map(|s| s.head).collect();
        assert_eq!(
            heads,
            [Coord::new(4, 7), Coord::new(5, 6), Coord::new(3, 6)]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn test_successors_allow_tail_cell() {
        // Square loop: moving right puts the head where the tail leaves
        let world = WorldState::new(
            10,
            vec![
                Coord::new(2, 2),
                Coord::new(2, 3),
                Coord::new(3, 3),
                Coord::new(3, 2),
            ],
            Direction::Up,
            None,
        )
        .unwrap();
        let problem = ReachFood::new(&world);
        assert!(problem
            .successors(&[])
            .iter()
            .any(|s| s.action == Direction::Right && s.head == Coord::new(3, 2)));
    }

    #[test]
    fn test_tail_cell_blocked_when_eating() {
        let world = WorldState::new(
            10,
            vec![
                Coord::new(2, 2),
                Coord::new(2, 3),
                Coord::new(3, 3),
                Coord::new(3, 2),
            ],
            Direction::Up,
            None,
        )
        .unwrap();
        let mut problem = ReachFood::new(&world);
        problem.snapshot.food = Some(Coord::new(3, 2));
        assert!(!problem
            .successors(&[])
            .iter()
            .any(|s| s.action == Direction::Right));
    }

    #[test]
    fn test_reach_food_goal() {
        let problem = ReachFood::new(&straight_world());
        assert!(problem.is_goal(Coord::new(8, 8)));
        assert!(!problem.is_goal(Coord::new(4, 4)));
        assert_eq!(problem.goal(), Some(Coord::new(8, 8)));
    }

    #[test]
    fn test_reach_food_without_food_has_no_goal() {
        let mut world = straight_world();
        world.set_food(None);
        let problem = ReachFood::new(&world);
        assert_eq!(problem.goal(), None);
        assert!(!problem.is_goal(Coord::new(4, 4)));
    }

    #[test]
    fn test_patrol_targets_even_board() {
        // 8x8 board: n = 7
        let targets = patrol_targets(7);
        assert_eq!(
            targets,
            vec![
                Coord::new(0, 0),
                Coord::new(0, 1),
                Coord::new(6, 1),
                Coord::new(6, 2),
                Coord::new(0, 2),
                Coord::new(0, 3),
                Coord::new(6, 3),
                Coord::new(6, 4),
                Coord::new(0, 4),
                Coord::new(0, 5),
                Coord::new(6, 5),
                Coord::new(6, 6),
                Coord::new(0, 6),
                Coord::new(0, 7),
                Coord::new(7, 7),
                Coord::new(7, 0),
            ]
        );
    }

    #[test]
    fn test_patrol_targets_cover_every_row_once_per_cycle() {
        for size in 5..=16 {
            let n = size - 1;
            let targets = patrol_targets(n);

            let unique: HashSet<Coord> = targets.iter().copied().collect();
            assert_eq!(unique.len(), targets.len(), "size {} repeats a target", size);

            let rows: HashSet<i32> = targets.iter().map(|c| c.y).collect();
            assert_eq!(rows.len() as i32, size, "size {} misses a row", size);

            assert!(targets.iter().all(|c| c.in_bounds(size)));
            assert_eq!(targets.last(), Some(&Coord::new(n, 0)), "size {} does not wrap", size);
        }
    }

    #[test]
    fn test_patrol_targets_are_consecutive_along_axes() {
        // Every hop between targets is a straight line, so the tour never
        // requires a diagonal shortcut
        let targets = patrol_targets(9);
        for pair in targets.windows(2) {
            assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
        }
    }

    #[test]
    fn test_reach_target_reset_cycles_targets() {
        let world = straight_world();
        let mut problem = ReachTarget::new(&world);
        assert_eq!(problem.target(), Coord::new(4, 0));

        let expected: Vec<Coord> = problem.targets().to_vec();
        for round in 0..2 {
            for want in &expected {
                problem.reset(&world);
                assert_eq!(problem.target(), *want, "round {}", round);
                assert!(problem.is_goal(*want));
            }
        }
    }
}
