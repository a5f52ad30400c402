// Informed best-first search over action sequences
//
// Both entry points expand paths from a frontier ordered by
// `cost + heuristic(head)`. Head cells are deduplicated on pop: the first
// path to pop a cell owns it and every later path reaching it is dropped.

use log::debug;
use std::collections::HashSet;

use crate::frontier::PriorityQueue;
use crate::problem::{Problem, Successor};
use crate::types::{Coord, Direction};

/// Unit of work in the frontier
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath {
    pub head: Coord,
    /// Actions taken so far, starting with the `Stop` root marker
    pub actions: Vec<Direction>,
    pub cost: u32,
}

impl SearchPath {
    fn root(head: Coord) -> Self {
        SearchPath {
            head,
            actions: vec![Direction::Stop],
            cost: 0,
        }
    }

    fn extend(&self, successor: &Successor) -> Self {
        let mut actions = Vec::with_capacity(self.actions.len() + 1);
        actions.extend_from_slice(&self.actions);
        actions.push(successor.action);

        SearchPath {
            head: successor.head,
            actions,
            cost: self.cost + successor.cost,
        }
    }

    /// Actions without the root marker
    fn into_plan(mut self) -> Vec<Direction> {
        self.actions.remove(0);
        self.actions
    }
}

/// Euclidean distance to the goal, zero when there is none.
///
/// The snake cannot move diagonally, so this underestimates loosely; it is a
/// fast guide rather than a tight bound.
pub fn heuristic(head: Coord, goal: Option<Coord>) -> f64 {
    goal.map_or(0.0, |g| head.euclidean(&g))
}

/// Runs until a goal head is popped. Returns an empty plan when the goal is
/// unreachable; callers fall back to a random legal move.
pub fn search(problem: &dyn Problem) -> Vec<Direction> {
    best_first(problem, None)
}

/// Same expansion loop, but gives up after `iterations` expansions and
/// returns whatever path is popped at that point, goal or not.
pub fn search_iterations(problem: &dyn Problem, iterations: usize) -> Vec<Direction> {
    best_first(problem, Some(iterations))
}

fn best_first(problem: &dyn Problem, limit: Option<usize>) -> Vec<Direction> {
    let goal = problem.goal();
    let mut frontier =
        PriorityQueue::with_priority(move |path: &SearchPath| path.cost as f64 + heuristic(path.head, goal));
    let mut visited: HashSet<Coord> = HashSet::new();
    let mut expansions = 0;

    frontier.push(SearchPath::root(problem.start()));

    while let Some(path) = frontier.pop() {
        if problem.is_goal(path.head) || limit == Some(expansions) {
            debug!(
                "Search stopped after {} expansions with a {}-step plan",
                expansions,
                path.actions.len() - 1
            );
            return path.into_plan();
        }

        if !visited.insert(path.head) {
            continue;
        }

        for successor in problem.successors(&path.actions) {
            if !visited.contains(&successor.head) {
                frontier.push(path.extend(&successor));
            }
        }
        expansions += 1;
    }

    debug!("Search exhausted the frontier after {} expansions", expansions);
    Vec::new()
}

/// Deepest-first exploration of every reachable head cell, returning the
/// longest action sequence found. Used to buy time when the goal is cut off.
pub fn longest_survival_path(problem: &dyn Problem) -> Vec<Direction> {
    let mut frontier = PriorityQueue::with_priority(|path: &SearchPath| -(path.actions.len() as f64));
    let mut visited: HashSet<Coord> = HashSet::new();
    let mut longest = SearchPath::root(problem.start());

    frontier.push(longest.clone());

    while let Some(path) = frontier.pop() {
        if !visited.insert(path.head) {
            continue;
        }

        for successor in problem.successors(&path.actions) {
            if !visited.contains(&successor.head) {
                frontier.push(path.extend(&successor));
            }
        }

        if path.actions.len() > longest.actions.len() {
            longest = path;
        }
    }

    longest.into_plan()
}
