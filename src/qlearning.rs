// Tabular Q-learning over StateKey x action
//
// The table is the only state that outlives a decision. It is handed to the
// agent by the caller (usually freshly loaded from disk) and handed back for
// saving when the session ends.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::config::{LearningConfig, MctsConfig, RewardConfig};
use crate::environment::Environment;
use crate::mcts::MonteCarloQLearning;
use crate::types::Direction;
use crate::world::{StateKey, WorldState};

/// One value per movement direction, indexed by `Direction::index`
pub type ActionValues = [f64; 4];

/// Sparse action-value table. Rows appear lazily, all zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: HashMap<StateKey, ActionValues>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, state: &StateKey) -> Option<&ActionValues> {
        self.values.get(state)
    }

    /// Row for `state`, created with zeros on first access
    pub fn row_mut(&mut self, state: &StateKey) -> &mut ActionValues {
        self.values.entry(state.clone()).or_insert([0.0; 4])
    }

    pub fn value(&self, state: &StateKey, action: Direction) -> f64 {
        self.values
            .get(state)
            .and_then(|row| row.get(action.index()).copied())
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: &StateKey, action: Direction, value: f64) {
        if let Some(slot) = self.row_mut(state).get_mut(action.index()) {
            *slot = value;
        }
    }

    /// Best value among the moves legal from `state`
    pub fn max_legal(&self, state: &StateKey) -> f64 {
        state
            .heading
            .legal_successors()
            .iter()
            .map(|a| self.value(state, *a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.values.iter()
    }
}

impl FromIterator<(StateKey, ActionValues)> for QTable {
    fn from_iter<I: IntoIterator<Item = (StateKey, ActionValues)>>(iter: I) -> Self {
        QTable {
            values: iter.into_iter().collect(),
        }
    }
}

/// Legal move with the highest value, ties broken uniformly at random
fn greedy_action(table: &QTable, state: &StateKey, rng: &mut StdRng) -> Direction {
    let legal = state.heading.legal_successors();
    let best = table.max_legal(state);
    let maxima: Vec<Direction> = legal
        .iter()
        .copied()
        .filter(|a| table.value(state, *a) == best)
        .collect();

    maxima
        .choose(rng)
        .or_else(|| legal.first())
        .copied()
        .unwrap_or(Direction::Stop)
}

/// Epsilon-greedy Q-learning agent
pub struct QAgent {
    table: QTable,
    environment: Environment,
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    rng: StdRng,
    /// State and action of the last decision, awaiting its reward
    pending: Option<(StateKey, Direction)>,
    episode_reward: f64,
}

impl QAgent {
    pub fn new(table: QTable, learning: &LearningConfig, rewards: &RewardConfig) -> Self {
        QAgent {
            table,
            environment: Environment::new(rewards.clone()),
            alpha: learning.alpha,
            gamma: learning.gamma,
            epsilon: learning.epsilon,
            rng: StdRng::from_os_rng(),
            pending: None,
            episode_reward: 0.0,
        }
    }

    /// Builder pattern: seed exploration and tie-breaking
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    /// Epsilon-greedy choice for the current world
    pub fn select_action(&mut self, world: &WorldState) -> Direction {
        let state = self.environment.state(world);
        self.table.row_mut(&state);

        let action = if self.rng.random::<f64>() < 1.0 - self.epsilon {
            greedy_action(&self.table, &state, &mut self.rng)
        } else {
            let legal = state.heading.legal_successors();
            legal
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Direction::Stop)
        };

        self.pending = Some((state, action));
        action
    }

    /// One-step TD update for the last decision, using the world after the
    /// action was applied.
    pub fn learn(&mut self, world: &WorldState) {
        let Some((state, action)) = self.pending.clone() else {
            return;
        };

        let reward = self.environment.reward(world);
        let next_state = self.environment.state(world);
        self.table.row_mut(&next_state);

        let old_value = self.table.value(&state, action);
        let next_max = self.table.max_legal(&next_state);
        let new_value =
            (1.0 - self.alpha) * old_value + self.alpha * (reward + self.gamma * next_max);
        self.table.set(&state, action, new_value);

        self.episode_reward += reward;
    }

    /// Forgets the pending decision and the running reward
    pub fn end_episode(&mut self) {
        debug!("Episode reward: {}", self.episode_reward);
        self.pending = None;
        self.episode_reward = 0.0;
    }

    fn remember(&mut self, state: StateKey, action: Direction) {
        self.pending = Some((state, action));
    }
}

/// Explore with simulation, exploit with the table.
///
/// Every state gets a budget of simulated decisions. While it lasts the
/// shaped MCTS variant decides and writes into the shared table; afterwards
/// the agent follows the table greedily. Without a budget it always
/// simulates.
pub struct HybridAgent {
    learner: QAgent,
    mcts: MctsConfig,
    learning: LearningConfig,
    rewards: RewardConfig,
    trial_budget: Option<u32>,
    trials: HashMap<StateKey, u32>,
}

impl HybridAgent {
    pub fn new(
        table: QTable,
        mcts: &MctsConfig,
        learning: &LearningConfig,
        rewards: &RewardConfig,
    ) -> Self {
        HybridAgent {
            learner: QAgent::new(table, learning, rewards),
            mcts: mcts.clone(),
            learning: learning.clone(),
            rewards: rewards.clone(),
            trial_budget: learning.trial_budget,
            trials: HashMap::new(),
        }
    }

    /// Builder pattern: seed the table policy's tie-breaking
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.learner = self.learner.with_seed(seed);
        self
    }

    pub fn table(&self) -> &QTable {
        self.learner.table()
    }

    pub fn into_table(self) -> QTable {
        self.learner.into_table()
    }

    /// Remaining simulated decisions for `state`, if a budget is set
    pub fn remaining_trials(&self, state: &StateKey) -> Option<u32> {
        self.trial_budget
            .map(|budget| self.trials.get(state).copied().unwrap_or(budget))
    }

    fn should_simulate(&mut self, state: &StateKey) -> bool {
        let Some(budget) = self.trial_budget else {
            return true;
        };
        let left = self.trials.entry(state.clone()).or_insert(budget);
        if *left > 0 {
            *left -= 1;
            true
        } else {
            false
        }
    }

    /// Simulates while the state's budget lasts, then follows the table
    pub fn select_action(&mut self, world: &WorldState) -> Direction {
        let state = world.key();
        self.learner.table.row_mut(&state);

        let action = if self.should_simulate(&state) {
            MonteCarloQLearning::new(world, &self.mcts, &self.learning, &self.rewards)
                .get_action(&mut self.learner.table)
                .action
        } else {
            debug!("Trial budget spent, following the table");
            greedy_action(&self.learner.table, &state, &mut self.learner.rng)
        };

        self.learner.remember(state, action);
        action
    }

    pub fn learn(&mut self, world: &WorldState) {
        self.learner.learn(world);
    }

    pub fn end_episode(&mut self) {
        self.learner.end_episode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::Coord;

    fn world() -> WorldState {
        WorldState::new(
            5,
            vec![Coord::new(2, 0), Coord::new(1, 0), Coord::new(0, 0)],
            Direction::Right,
            Some(Coord::new(4, 0)),
        )
        .unwrap()
    }

    fn agent(epsilon: f64) -> QAgent {
        let mut config = Config::default_hardcoded();
        config.learning.epsilon = epsilon;
        QAgent::new(QTable::new(), &config.learning, &config.rewards).with_seed(21)
    }

    #[test]
    fn test_rows_are_created_lazily_with_zeros() {
        let mut table = QTable::new();
        let key = world().key();
        assert!(table.get(&key).is_none());
        assert_eq!(table.value(&key, Direction::Up), 0.0);

        assert_eq!(*table.row_mut(&key), [0.0; 4]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_select_action_creates_row_and_stays_legal() {
        let mut agent = agent(0.5);
        let w = world();
        for _ in 0..50 {
            let action = agent.select_action(&w);
            assert_ne!(action, Direction::Left);
        }
        assert_eq!(agent.table().len(), 1);
    }

    #[test]
    fn test_greedy_picks_maximum() {
        let mut agent = agent(0.0);
        let w = world();
        agent.table.set(&w.key(), Direction::Down, 3.0);
        agent.table.set(&w.key(), Direction::Right, 1.0);
        for _ in 0..20 {
            assert_eq!(agent.select_action(&w), Direction::Down);
        }
    }

    #[test]
    fn test_greedy_ignores_reversal_slot() {
        let mut agent = agent(0.0);
        let w = world();
        agent.table.set(&w.key(), Direction::Left, 50.0);
        agent.table.set(&w.key(), Direction::Right, 1.0);
        assert_eq!(agent.select_action(&w), Direction::Right);
    }

    #[test]
    fn test_greedy_breaks_ties_randomly() {
        let mut agent = agent(0.0);
        let w = world();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(agent.select_action(&w));
        }
        assert_eq!(seen.len(), 3, "all three legal zero-valued moves get picked");
    }

    #[test]
    fn test_td_update_on_collision() {
        let mut agent = agent(0.0);
        let mut w = world();
        agent.table.set(&w.key(), Direction::Up, 5.0);
        agent.table.set(&w.key(), Direction::Right, -5.0);
        agent.table.set(&w.key(), Direction::Down, -5.0);

        let before = w.key();
        let action = agent.select_action(&w);
        assert_eq!(action, Direction::Up);
        w.step(action);
        agent.learn(&w);

        // 0.7 * 5 + 0.3 * (-20 + 0.1 * 0)
        let expected = 0.7 * 5.0 + 0.3 * -20.0;
        assert!((agent.table().value(&before, Direction::Up) - expected).abs() < 1e-9);
        assert_eq!(agent.episode_reward(), -20.0);
    }

    #[test]
    fn test_td_update_uses_next_state_maximum() {
        let mut agent = agent(0.0);
        let mut w = world();
        agent.table.set(&w.key(), Direction::Right, 1.0);

        let mut next = w.clone();
        next.step(Direction::Right);
        agent.table.set(&next.key(), Direction::Right, 10.0);

        let before = w.key();
        assert_eq!(agent.select_action(&w), Direction::Right);
        w.step(Direction::Right);
        agent.learn(&w);

        // 0.7 * 1 + 0.3 * (-1 + 0.1 * 10)
        let expected = 0.7 * 1.0 + 0.3 * (-1.0 + 0.1 * 10.0);
        assert!((agent.table().value(&before, Direction::Right) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_learn_without_decision_is_noop() {
        let mut agent = agent(0.0);
        agent.learn(&world());
        assert!(agent.table().is_empty());
    }

    #[test]
    fn test_reset_clears_episode() {
        let mut agent = agent(0.0);
        let mut w = world();
        let action = agent.select_action(&w);
        w.step(action);
        agent.learn(&w);
        agent.end_episode();
        assert_eq!(agent.episode_reward(), 0.0);
        let rows = agent.table().len();
        agent.learn(&w);
        assert_eq!(agent.table().len(), rows);
    }

    #[test]
    fn test_hybrid_switches_to_table_after_budget() {
        let mut config = Config::default_hardcoded();
        config.mcts.time_budget_ms = 2;
        config.learning.trial_budget = Some(2);
        let mut agent =
            HybridAgent::new(QTable::new(), &config.mcts, &config.learning, &config.rewards)
                .with_seed(4);
        let w = world();
        let key = w.key();

        assert_eq!(agent.remaining_trials(&key), Some(2));
        agent.select_action(&w);
        agent.select_action(&w);
        assert_eq!(agent.remaining_trials(&key), Some(0));

        // Table policy from here on: force a clear favourite
        agent.learner.table.set(&key, Direction::Down, 1.0e9);
        assert_eq!(agent.select_action(&w), Direction::Down);
        assert_eq!(agent.remaining_trials(&key), Some(0));
    }

    #[test]
    fn test_hybrid_simulation_writes_table() {
        let mut config = Config::default_hardcoded();
        config.mcts.time_budget_ms = 10;
        config.learning.trial_budget = None;
        let mut agent =
            HybridAgent::new(QTable::new(), &config.mcts, &config.learning, &config.rewards);
        let w = world();

        agent.select_action(&w);
        let row = agent.table().get(&w.key()).copied().unwrap();
        assert!(row.iter().any(|v| *v != 0.0));
        assert_eq!(agent.remaining_trials(&w.key()), None);
    }
}
