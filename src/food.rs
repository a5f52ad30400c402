// Food placement for the caller's loop
//
// Planners never spawn food; they only consume whatever cell the world holds.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;

use crate::types::Coord;
use crate::world::WorldState;

/// Places food on a uniformly random empty cell
pub struct FoodSpawner {
    rng: StdRng,
}

impl FoodSpawner {
    pub fn new() -> Self {
        FoodSpawner {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        FoodSpawner {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks a cell, stores it in the world and returns it.
    /// Returns `None` once the snake fills the whole board.
    pub fn spawn(&mut self, world: &mut WorldState) -> Option<Coord> {
        let food = world.empty_cells().into_iter().choose(&mut self.rng);
        world.set_food(food);

        match food {
            Some(cell) => debug!("Spawned food at {}", cell),
            None => debug!("No empty cell left for food"),
        }
        food
    }
}

impl Default for FoodSpawner {
    fn default() -> Self {
        Self::new()
    }
}
