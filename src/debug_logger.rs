// Debug logging module for per-tick decision logging
//
// Each decision is appended to a JSONL file together with the world it was
// made in. The handle is cheap to clone so parallel episodes can share it.

use log::error;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::types::Direction;
use crate::world::WorldState;

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry<'a> {
    episode: usize,
    tick: usize,
    agent: &'a str,
    chosen_move: &'a str,
    world: &'a WorldState,
    timestamp: String,
}

/// Shared debug logger state
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one decision. Failures are logged and otherwise ignored.
    pub fn log_move(
        &self,
        episode: usize,
        tick: usize,
        agent: &str,
        world: &WorldState,
        chosen_move: Direction,
    ) {
        if !self.enabled {
            return;
        }

        let entry = DebugLogEntry {
            episode,
            tick,
            agent,
            chosen_move: chosen_move.as_str(),
            world,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
                return;
            }
        };

        let mut file_guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(file) = file_guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", json_line) {
                error!("Failed to write debug log entry: {}", e);
            } else if let Err(e) = file.flush() {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }
}
