// Decision makers driven by the session loop
//
// Agents only choose. The caller applies the chosen move to the live world
// and reports back through `update` once the move has played out.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::fmt;
use std::str::FromStr;

use crate::config::{Config, MctsConfig, SearchConfig};
use crate::mcts::MonteCarloTreeSearch;
use crate::problem::{Problem, ReachFood, ReachTarget};
use crate::qlearning::{HybridAgent, QAgent, QTable};
use crate::search::{longest_survival_path, search, search_iterations};
use crate::types::Direction;
use crate::world::WorldState;

/// Common interface of every policy
pub trait Agent {
    fn name(&self) -> &'static str;

    /// Chooses the next move for `world`. Must not assume the move is applied.
    fn next_action(&mut self, world: &WorldState) -> Direction;

    /// Called with the world after the chosen move was applied
    fn update(&mut self, _world: &WorldState) {}

    /// Called with the fresh world at the start of every episode
    fn reset(&mut self, _world: &WorldState) {}

    /// Learned table, for agents that keep one
    fn table(&self) -> Option<&QTable> {
        None
    }
}

/// Uniformly random legal move, the fallback of every planner
fn random_legal(world: &WorldState, rng: &mut StdRng) -> Direction {
    world
        .heading()
        .legal_successors()
        .choose(rng)
        .copied()
        .unwrap_or(Direction::Stop)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Picks any of the four directions, reversals included
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        RandomAgent {
            rng: seeded_rng(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &'static str {
        "random"
    }

    fn next_action(&mut self, _world: &WorldState) -> Direction {
        Direction::moves()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Direction::Stop)
    }
}

/// Greedy one-step planner: replans from scratch every tick with a tiny
/// expansion budget, which makes it approach food in a zig-zag.
pub struct ZigZagAgent {
    problem: Option<ReachFood>,
    iterations: usize,
    rng: StdRng,
}

impl ZigZagAgent {
    pub fn new(config: &SearchConfig, seed: Option<u64>) -> Self {
        ZigZagAgent {
            problem: None,
            iterations: config.zigzag_iterations,
            rng: seeded_rng(seed),
        }
    }
}

impl Agent for ZigZagAgent {
    fn name(&self) -> &'static str {
        "zigzag"
    }

    fn next_action(&mut self, world: &WorldState) -> Direction {
        let problem = self.problem.get_or_insert_with(|| ReachFood::new(world));
        problem.reset(world);

        match search_iterations(&*problem, self.iterations).first() {
            Some(action) => *action,
            None => random_legal(world, &mut self.rng),
        }
    }
}

/// Follows a full shortest plan to the food, replanning once it runs out
pub struct SmartAgent {
    plan: Vec<Direction>,
    rng: StdRng,
}

impl SmartAgent {
    pub fn new(seed: Option<u64>) -> Self {
        SmartAgent {
            plan: Vec::new(),
            rng: seeded_rng(seed),
        }
    }

    pub fn plan(&self) -> &[Direction] {
        &self.plan
    }
}

impl Agent for SmartAgent {
    fn name(&self) -> &'static str {
        "smart"
    }

    fn next_action(&mut self, world: &WorldState) -> Direction {
        if self.plan.is_empty() {
            let problem = ReachFood::new(world);
            self.plan = search(&problem);

            if self.plan.is_empty() {
                // Food is cut off: stall along the longest open path
                let survival = longest_survival_path(&problem);
                debug!("No path to food, survival path of {} moves", survival.len());
                return survival
                    .first()
                    .copied()
                    .unwrap_or_else(|| random_legal(world, &mut self.rng));
            }
        }

        self.plan.remove(0)
    }

    fn reset(&mut self, _world: &WorldState) {
        self.plan.clear();
    }
}

/// Patrols the board along a fixed boustrophedon tour, eating whatever
/// food lies on the way.
pub struct OroborusAgent {
    problem: Option<ReachTarget>,
    plan: Vec<Direction>,
    fallback_iterations: usize,
    rng: StdRng,
}

impl OroborusAgent {
    pub fn new(config: &SearchConfig, seed: Option<u64>) -> Self {
        OroborusAgent {
            problem: None,
            plan: Vec::new(),
            fallback_iterations: config.patrol_fallback_iterations,
            rng: seeded_rng(seed),
        }
    }

    /// Climbs straight to the top row before the tour begins
    fn start_patrol(&mut self, world: &WorldState) {
        let problem = ReachTarget::new(world);
        debug!("Climbing to {} before patrolling", problem.target());
        self.plan = search(&problem);
        self.problem = Some(problem);
    }
}

impl Agent for OroborusAgent {
    fn name(&self) -> &'static str {
        "oroborus"
    }

    fn next_action(&mut self, world: &WorldState) -> Direction {
        if self.problem.is_none() {
            self.start_patrol(world);
        }

        if self.plan.is_empty() {
            let problem = self.problem.get_or_insert_with(|| ReachTarget::new(world));
            problem.reset(world);
            debug!("Patrolling towards {}", problem.target());

            self.plan = search(&*problem);
            if self.plan.is_empty() {
                self.plan = search_iterations(&*problem, self.fallback_iterations);
            }
            if self.plan.is_empty() {
                return random_legal(world, &mut self.rng);
            }
        }

        self.plan.remove(0)
    }

    fn reset(&mut self, world: &WorldState) {
        self.start_patrol(world);
    }
}

/// Runs a fresh tree search for every decision
pub struct MctsAgent {
    config: MctsConfig,
}

impl MctsAgent {
    pub fn new(config: &MctsConfig) -> Self {
        MctsAgent {
            config: config.clone(),
        }
    }
}

impl Agent for MctsAgent {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn next_action(&mut self, world: &WorldState) -> Direction {
        MonteCarloTreeSearch::new(world, &self.config)
            .get_action()
            .action
    }
}

impl Agent for QAgent {
    fn name(&self) -> &'static str {
        "q"
    }

    fn next_action(&mut self, world: &WorldState) -> Direction {
        self.select_action(world)
    }

    fn update(&mut self, world: &WorldState) {
        self.learn(world);
    }

    fn reset(&mut self, _world: &WorldState) {
        self.end_episode();
    }

    fn table(&self) -> Option<&QTable> {
        Some(QAgent::table(self))
    }
}

impl Agent for HybridAgent {
    fn name(&self) -> &'static str {
        "mcq"
    }

    fn next_action(&mut self, world: &WorldState) -> Direction {
        self.select_action(world)
    }

    fn update(&mut self, world: &WorldState) {
        self.learn(world);
    }

    fn reset(&mut self, _world: &WorldState) {
        self.end_episode();
    }

    fn table(&self) -> Option<&QTable> {
        Some(HybridAgent::table(self))
    }
}

/// Agent selector for the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Random,
    ZigZag,
    Smart,
    Oroborus,
    Mcts,
    Q,
    Hybrid,
}

impl AgentKind {
    pub fn all() -> [AgentKind; 7] {
        [
            AgentKind::Random,
            AgentKind::ZigZag,
            AgentKind::Smart,
            AgentKind::Oroborus,
            AgentKind::Mcts,
            AgentKind::Q,
            AgentKind::Hybrid,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Random => "random",
            AgentKind::ZigZag => "zigzag",
            AgentKind::Smart => "smart",
            AgentKind::Oroborus => "oroborus",
            AgentKind::Mcts => "mcts",
            AgentKind::Q => "q",
            AgentKind::Hybrid => "mcq",
        }
    }

    /// Learning agents share one table across episodes, so their episodes
    /// must run one after another.
    pub fn is_learning(&self) -> bool {
        matches!(self, AgentKind::Q | AgentKind::Hybrid)
    }

    /// Builds the agent. `table` is only consumed by learning agents.
    pub fn build(&self, config: &Config, table: QTable, seed: Option<u64>) -> Box<dyn Agent> {
        info!("Building {} agent", self);
        match self {
            AgentKind::Random => Box::new(RandomAgent::new(seed)),
            AgentKind::ZigZag => Box::new(ZigZagAgent::new(&config.search, seed)),
            AgentKind::Smart => Box::new(SmartAgent::new(seed)),
            AgentKind::Oroborus => Box::new(OroborusAgent::new(&config.search, seed)),
            AgentKind::Mcts => Box::new(MctsAgent::new(&config.mcts)),
            AgentKind::Q => {
                let agent = QAgent::new(table, &config.learning, &config.rewards);
                match seed {
                    Some(seed) => Box::new(agent.with_seed(seed)),
                    None => Box::new(agent),
                }
            }
            AgentKind::Hybrid => {
                let agent =
                    HybridAgent::new(table, &config.mcts, &config.learning, &config.rewards);
                match seed {
                    Some(seed) => Box::new(agent.with_seed(seed)),
                    None => Box::new(agent),
                }
            }
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::all()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = AgentKind::all().iter().map(|k| k.as_str()).collect();
                format!("Unknown agent '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
