// Headless game loop
//
// Owns the live world and plays the caller's part of the agent contract:
// snapshot, ask, apply, report back, respawn food.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::agents::Agent;
use crate::debug_logger::DebugLogger;
use crate::error::SnakeError;
use crate::food::FoodSpawner;
use crate::world::{WorldState, MIN_BOARD_SIZE};

/// Why an episode stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    Collision,
    /// The snake covers every cell, no food can be placed
    BoardFull,
    TickLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeSummary {
    pub episode: usize,
    /// Food eaten
    pub score: u32,
    pub ticks: usize,
    pub end: EpisodeEnd,
}

pub struct Session {
    board_size: i32,
    spawner: FoodSpawner,
    logger: DebugLogger,
    /// score -> number of episodes ending with it
    histogram: BTreeMap<u32, usize>,
    episodes_played: usize,
}

impl Session {
    pub fn new(board_size: i32, seed: Option<u64>) -> Result<Self, SnakeError> {
        if board_size < MIN_BOARD_SIZE {
            return Err(SnakeError::BoardTooSmall(board_size));
        }

        Ok(Session {
            board_size,
            spawner: seed.map_or_else(FoodSpawner::new, FoodSpawner::seeded),
            logger: DebugLogger::disabled(),
            histogram: BTreeMap::new(),
            episodes_played: 0,
        })
    }

    /// Builder pattern: record every decision to `logger`
    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Numbers the next episode; lets parallel sessions keep distinct ids
    pub fn starting_at(mut self, episode: usize) -> Self {
        self.episodes_played = episode;
        self
    }

    pub fn histogram(&self) -> &BTreeMap<u32, usize> {
        &self.histogram
    }

    /// Plays one episode from the initial layout
    pub fn run_episode(&mut self, agent: &mut dyn Agent, max_ticks: usize) -> EpisodeSummary {
        let mut world = WorldState::initial(self.board_size);
        self.spawner.spawn(&mut world);
        self.play(world, agent, max_ticks)
    }

    /// Plays one episode from a caller-built world. Food is only respawned
    /// after the snake eats.
    pub fn play(
        &mut self,
        mut world: WorldState,
        agent: &mut dyn Agent,
        max_ticks: usize,
    ) -> EpisodeSummary {
        let episode = self.episodes_played;
        self.episodes_played += 1;
        agent.reset(&world);

        let mut score = 0;
        let mut end = EpisodeEnd::TickLimit;
        let mut ticks = 0;

        while ticks < max_ticks {
            let snapshot = world.clone();
            let action = agent.next_action(&snapshot);
            self.logger
                .log_move(episode, ticks, agent.name(), &snapshot, action);

            let outcome = world.step(action);
            ticks += 1;
            let collided = world.check_collision();
            agent.update(&world);

            if collided {
                debug!("Episode {} collided at {} on tick {}", episode, outcome.head, ticks);
                end = EpisodeEnd::Collision;
                break;
            }

            if outcome.ate_food {
                score += 1;
                if self.spawner.spawn(&mut world).is_none() {
                    end = EpisodeEnd::BoardFull;
                    break;
                }
            }
        }

        *self.histogram.entry(score).or_insert(0) += 1;
        info!(
            "[{}] Episode {}: score {} after {} ticks ({:?})",
            agent.name(),
            episode,
            score,
            ticks,
            end
        );

        EpisodeSummary {
            episode,
            score,
            ticks,
            end,
        }
    }

    /// Plays `episodes` episodes back to back with the same agent
    pub fn run(
        &mut self,
        agent: &mut dyn Agent,
        episodes: usize,
        max_ticks: usize,
    ) -> Vec<EpisodeSummary> {
        (0..episodes)
            .map(|_| self.run_episode(agent, max_ticks))
            .collect()
    }
}

/// Sums per-session histograms
pub fn merge_histograms<'a, I>(histograms: I) -> BTreeMap<u32, usize>
where
    I: IntoIterator<Item = &'a BTreeMap<u32, usize>>,
{
    let mut merged = BTreeMap::new();
    for histogram in histograms {
        for (score, count) in histogram {
            *merged.entry(*score).or_insert(0) += count;
        }
    }
    merged
}
