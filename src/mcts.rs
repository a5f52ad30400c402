// Monte Carlo Tree Search over a private copy of the world
//
// Statistics are keyed by `StateKey` and live only for one planning call.
// Each call runs random/UCT rollouts until the wall-clock budget is spent;
// the budget is checked between rollouts, never inside one, so a call can
// overrun by the length of its last rollout.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::config::{LearningConfig, MctsConfig, RewardConfig};
use crate::qlearning::QTable;
use crate::types::Direction;
use crate::world::{StateKey, WorldState};

/// Outcome of a simulated state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Win,
    Lose,
    InProgress,
}

/// Forward model used by rollouts. Holds only the board size and the root
/// key, so it can never reach the caller's live world.
#[derive(Debug, Clone)]
pub struct Simulator {
    size: i32,
    start: StateKey,
}

impl Simulator {
    pub fn new(world: &WorldState) -> Self {
        Simulator {
            size: world.size(),
            start: world.key(),
        }
    }

    pub fn start_state(&self) -> &StateKey {
        &self.start
    }

    /// State reached by taking `action` from `state`
    pub fn next_state(&self, state: &StateKey, action: Direction) -> StateKey {
        let mut world = WorldState::from_key(self.size, state);
        world.step(action);
        world.key()
    }

    pub fn legal_actions(&self, state: &StateKey) -> Vec<Direction> {
        state.heading.legal_successors()
    }

    pub fn status(&self, state: &StateKey) -> GameStatus {
        if state.target == Some(state.head()) {
            GameStatus::Win
        } else if WorldState::from_key(self.size, state).check_collision() {
            GameStatus::Lose
        } else {
            GameStatus::InProgress
        }
    }
}

/// How a finished rollout credits the states it passed through
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RewardRule {
    /// One point per win, nothing otherwise
    WinCount,
    /// Dense shaping: bonus on win, penalty on loss, small cost otherwise
    Shaped { win: f64, lose: f64, step: f64 },
}

impl RewardRule {
    pub fn shaped(rewards: &RewardConfig) -> Self {
        RewardRule::Shaped {
            win: rewards.food,
            lose: rewards.collision,
            step: rewards.step,
        }
    }

    fn credit(&self, status: GameStatus) -> f64 {
        match (self, status) {
            (RewardRule::WinCount, GameStatus::Win) => 1.0,
            (RewardRule::WinCount, _) => 0.0,
            (RewardRule::Shaped { win, .. }, GameStatus::Win) => *win,
            (RewardRule::Shaped { lose, .. }, GameStatus::Lose) => *lose,
            (RewardRule::Shaped { step, .. }, GameStatus::InProgress) => *step,
        }
    }
}

/// Result of one planning call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub action: Direction,
    /// Average credit of the chosen successor
    pub win_rate: f64,
    pub rollouts: usize,
    /// Deepest rollout step at which a new node was added
    pub max_depth: usize,
}

pub struct MonteCarloTreeSearch {
    simulator: Simulator,
    exploration: f64,
    time_budget: Duration,
    max_moves: usize,
    reward: RewardRule,
    plays: HashMap<StateKey, u32>,
    wins: HashMap<StateKey, f64>,
    max_depth: usize,
    rng: StdRng,
}

impl MonteCarloTreeSearch {
    pub fn new(world: &WorldState, config: &MctsConfig) -> Self {
        MonteCarloTreeSearch {
            simulator: Simulator::new(world),
            exploration: config.exploration,
            time_budget: config.time_budget(),
            max_moves: config.max_moves,
            reward: RewardRule::WinCount,
            plays: HashMap::new(),
            wins: HashMap::new(),
            max_depth: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Builder pattern: use a seeded generator for the random playouts
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Builder pattern: replace the credit rule
    pub fn with_reward(mut self, reward: RewardRule) -> Self {
        self.reward = reward;
        self
    }

    /// Visit count of `state`, zero when untracked
    pub fn plays(&self, state: &StateKey) -> u32 {
        self.plays.get(state).copied().unwrap_or(0)
    }

    /// Accumulated credit of `state`, zero when untracked
    pub fn wins(&self, state: &StateKey) -> f64 {
        self.wins.get(state).copied().unwrap_or(0.0)
    }

    /// Runs rollouts until the budget is spent and picks the successor with
    /// the best average credit.
    pub fn get_action(&mut self) -> SearchReport {
        let (successors, rollouts) = self.explore();
        let (win_rate, action) = self.best_average(&successors);
        self.log_statistics(&successors, rollouts);

        SearchReport {
            action,
            win_rate,
            rollouts,
            max_depth: self.max_depth,
        }
    }

    /// Deadline loop. Returns the root's successor states and the number of
    /// rollouts completed.
    fn explore(&mut self) -> (Vec<StateKey>, usize) {
        self.plays.clear();
        self.wins.clear();
        self.max_depth = 0;
        let root = self.simulator.start_state().clone();
        let successors: Vec<StateKey> = self
            .simulator
            .legal_actions(&root)
            .into_iter()
            .map(|action| self.simulator.next_state(&root, action))
            .collect();

        let begin = Instant::now();
        let mut rollouts = 0;
        while begin.elapsed() < self.time_budget {
            self.run_simulation();
            rollouts += 1;
        }

        debug!("Rollouts: {}, duration: {:?}", rollouts, begin.elapsed());
        (successors, rollouts)
    }

    /// One rollout: UCT while every successor has statistics, random
    /// otherwise, adding at most one new node.
    fn run_simulation(&mut self) {
        let mut visited: HashSet<StateKey> = HashSet::new();
        let mut state = self.simulator.start_state().clone();
        let mut expand = true;
        let mut status = GameStatus::InProgress;

        for depth in 1..=self.max_moves {
            let states: Vec<StateKey> = self
                .simulator
                .legal_actions(&state)
                .into_iter()
                .map(|action| self.simulator.next_state(&state, action))
                .collect();

            let fully_tracked = states.iter().all(|s| self.plays(s) > 0);
            let chosen = if fully_tracked {
                self.best_uct(&states).map(|(_, _, s)| s.clone())
            } else {
                states.choose(&mut self.rng).cloned()
            };
            let Some(next) = chosen else { break };
            state = next;

            if expand && !self.plays.contains_key(&state) {
                expand = false;
                self.plays.insert(state.clone(), 0);
                self.wins.insert(state.clone(), 0.0);
                self.max_depth = self.max_depth.max(depth);
            }

            visited.insert(state.clone());
            status = self.simulator.status(&state);
            if status != GameStatus::InProgress {
                break;
            }
        }

        let credit = self.reward.credit(status);
        for state in visited {
            if let Some(plays) = self.plays.get_mut(&state) {
                *plays += 1;
                if let Some(wins) = self.wins.get_mut(&state) {
                    *wins += credit;
                }
            }
        }
    }

    /// UCT score of every visited state in `states`, returning the best as
    /// (score, action, state). Ties go to the higher action label.
    fn best_uct<'a>(&self, states: &'a [StateKey]) -> Option<(f64, Direction, &'a StateKey)> {
        let tracked: Vec<&StateKey> = states.iter().filter(|s| self.plays(s) > 0).collect();
        let total: u32 = tracked.iter().map(|s| self.plays(s)).sum();
        let total_log = (total as f64).ln();

        tracked
            .into_iter()
            .map(|s| {
                let plays = self.plays(s) as f64;
                let score = self.wins(s) / plays + self.exploration * (total_log / plays).sqrt();
                (score, s.heading, s)
            })
            .max_by(|a, b| compare_scored(a.0, a.1, b.0, b.1))
    }

    /// Highest average credit among `states`, unseen states counting as 0/1
    fn best_average(&self, states: &[StateKey]) -> (f64, Direction) {
        states
            .iter()
            .map(|s| (self.wins(s) / self.plays(s).max(1) as f64, s.heading))
            .max_by(|a, b| compare_scored(a.0, a.1, b.0, b.1))
            .unwrap_or((0.0, Direction::Stop))
    }

    fn log_statistics(&self, successors: &[StateKey], rollouts: usize) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        for s in successors {
            debug!(
                "{}: {:.2} ({} / {})",
                s.heading.as_str(),
                self.wins(s) / self.plays(s).max(1) as f64,
                self.wins(s),
                self.plays(s)
            );
        }
        debug!("Rollouts: {}, maximum depth searched: {}", rollouts, self.max_depth);
    }
}

fn compare_scored(a_score: f64, a_action: Direction, b_score: f64, b_action: Direction) -> Ordering {
    a_score
        .total_cmp(&b_score)
        .then_with(|| a_action.index().cmp(&b_action.index()))
}

/// Shaped-reward MCTS that folds each decision into a persistent Q-table
pub struct MonteCarloQLearning {
    search: MonteCarloTreeSearch,
    alpha: f64,
    gamma: f64,
}

impl MonteCarloQLearning {
    pub fn new(
        world: &WorldState,
        mcts: &MctsConfig,
        learning: &LearningConfig,
        rewards: &RewardConfig,
    ) -> Self {
        MonteCarloQLearning {
            search: MonteCarloTreeSearch::new(world, mcts).with_reward(RewardRule::shaped(rewards)),
            alpha: learning.alpha,
            gamma: learning.gamma,
        }
    }

    /// Builder pattern: use a seeded generator for the random playouts
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.search = self.search.with_seed(seed);
        self
    }

    /// Runs the rollouts, blends every root action's outcome into `table`
    /// and returns the successor with the best UCT score.
    pub fn get_action(&mut self, table: &mut QTable) -> SearchReport {
        let (successors, rollouts) = self.search.explore();
        let root = self.search.simulator.start_state().clone();

        let (next_max, action, win_rate) = match self.search.best_uct(&successors) {
            Some((score, action, state)) => (
                score,
                action,
                self.search.wins(state) / self.search.plays(state).max(1) as f64,
            ),
            None => {
                let (win_rate, action) = self.search.best_average(&successors);
                (0.0, action, win_rate)
            }
        };

        let row = table.row_mut(&root);
        for state in &successors {
            let slot = state.heading.index();
            row[slot] = (1.0 - self.alpha) * row[slot]
                + self.alpha * (self.search.wins(state) + self.gamma * next_max);
        }

        self.search.log_statistics(&successors, rollouts);
        SearchReport {
            action,
            win_rate,
            rollouts,
            max_depth: self.search.max_depth,
        }
    }
}
