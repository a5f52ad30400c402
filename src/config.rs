// Configuration module for reading Agent.toml
// Every tunable constant of the planners and the session loop lives here

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub mcts: MctsConfig,
    pub learning: LearningConfig,
    pub rewards: RewardConfig,
    pub session: SessionConfig,
    pub persistence: PersistenceConfig,
    pub debug: DebugConfig,
}

/// Expansion budgets for the anytime search agents
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub zigzag_iterations: usize,
    pub patrol_fallback_iterations: usize,
}

/// Monte Carlo Tree Search parameters
#[derive(Debug, Deserialize, Clone)]
pub struct MctsConfig {
    pub time_budget_ms: u64,
    pub max_moves: usize,
    pub exploration: f64,
}

impl MctsConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Builder pattern: set the wall-clock budget per decision
    pub fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = ms;
        self
    }
}

/// Tabular Q-learning parameters
#[derive(Debug, Deserialize, Clone)]
pub struct LearningConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    /// Simulated decisions allowed per state before the hybrid agent
    /// switches to its table. Absent means always simulate.
    #[serde(default)]
    pub trial_budget: Option<u32>,
}

/// Reward shape shared by the environment and the shaped MCTS variant
#[derive(Debug, Deserialize, Clone)]
pub struct RewardConfig {
    pub food: f64,
    pub collision: f64,
    pub step: f64,
}

/// Headless game loop settings
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub board_size: i32,
    pub episodes: usize,
    pub max_ticks_per_episode: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Where learned tables are kept between runs
#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    pub directory: String,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Agent.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Agent.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Agent.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Agent.toml
    pub fn default_hardcoded() -> Self {
        Config {
            search: SearchConfig {
                zigzag_iterations: 1,
                patrol_fallback_iterations: 10,
            },
            mcts: MctsConfig {
                time_budget_ms: 140,
                max_moves: 100,
                exploration: 1.41,
            },
            learning: LearningConfig {
                alpha: 0.3,
                gamma: 0.1,
                epsilon: 0.1,
                trial_budget: Some(30),
            },
            rewards: RewardConfig {
                food: 20.0,
                collision: -20.0,
                step: -1.0,
            },
            session: SessionConfig {
                board_size: 8,
                episodes: 30,
                max_ticks_per_episode: 1000,
                seed: None,
            },
            persistence: PersistenceConfig {
                directory: "files".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_agents_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Agent.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
