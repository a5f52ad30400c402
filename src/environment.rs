// Environment: scores a world snapshot for the learning agents

use crate::config::RewardConfig;
use crate::world::{StateKey, WorldState};

#[derive(Debug, Clone)]
pub struct Environment {
    rewards: RewardConfig,
}

impl Environment {
    pub fn new(rewards: RewardConfig) -> Self {
        Environment { rewards }
    }

    /// Reward for the world as it stands right after a move.
    /// Reaching the food outranks a collision on the same tick.
    pub fn reward(&self, world: &WorldState) -> f64 {
        if world.food() == Some(world.head()) {
            self.rewards.food
        } else if world.check_collision() {
            self.rewards.collision
        } else {
            self.rewards.step
        }
    }

    pub fn state(&self, world: &WorldState) -> StateKey {
        world.key()
    }
}
