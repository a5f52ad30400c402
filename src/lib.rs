// Library exports for the snake agents
// The binary and the integration tests drive the planners through these

pub mod agents;
pub mod config;
pub mod debug_logger;
pub mod environment;
pub mod error;
pub mod food;
pub mod frontier;
pub mod mcts;
pub mod persistence;
pub mod problem;
pub mod qlearning;
pub mod search;
pub mod session;
pub mod types;
pub mod world;
