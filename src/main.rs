// Headless runner: plays episodes of one agent and reports the scores

use log::{error, info};
use rayon::prelude::*;
use std::env;
use std::process;

use snake_agents::agents::AgentKind;
use snake_agents::config::Config;
use snake_agents::debug_logger::DebugLogger;
use snake_agents::error::SnakeError;
use snake_agents::persistence;
use snake_agents::qlearning::QTable;
use snake_agents::session::{merge_histograms, Session};

fn print_usage() {
    eprintln!("Usage: snake-agents [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --agent <NAME>      random, zigzag, smart, oroborus, mcts, q, mcq (default: smart)");
    eprintln!("  --size <N>          Board size, at least 5 (default: from config)");
    eprintln!("  --episodes <N>      Episodes to play (default: from config)");
    eprintln!("  --seed <N>          Seed food placement and agent randomness");
    eprintln!("  --config <PATH>     Configuration file (default: Agent.toml)");
    eprintln!("  --help              Show this message");
}

fn option_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires an argument", flag);
            process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: &str, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    value.parse().unwrap_or_else(|e| {
        eprintln!("Error: invalid value '{}' for {}: {}", value, flag, e);
        process::exit(1);
    })
}

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(0);
    }

    let mut kind = AgentKind::Smart;
    let mut size = None;
    let mut episodes = None;
    let mut seed = None;
    let mut config_path = None;

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--agent" => kind = parse_or_exit(option_value(&args, i, flag), flag),
            "--size" => size = Some(parse_or_exit::<i32>(option_value(&args, i, flag), flag)),
            "--episodes" => {
                episodes = Some(parse_or_exit::<usize>(option_value(&args, i, flag), flag))
            }
            "--seed" => seed = Some(parse_or_exit::<u64>(option_value(&args, i, flag), flag)),
            "--config" => config_path = Some(option_value(&args, i, flag).to_string()),
            _ => {
                eprintln!("Error: Unknown option '{}'", flag);
                print_usage();
                process::exit(1);
            }
        }
        i += 2;
    }

    // Load configuration once at startup
    let config = match config_path {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };

    let size = size.unwrap_or(config.session.board_size);
    let episodes = episodes.unwrap_or(config.session.episodes);
    let seed = seed.or(config.session.seed);
    let max_ticks = config.session.max_ticks_per_episode;
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path);

    info!(
        "Playing {} episodes of {} on a {}x{} board",
        episodes, kind, size, size
    );

    let histogram = if kind.is_learning() {
        // One table shared by every episode, so they run in order
        let table = persistence::load_table(&config.persistence.directory, size);
        let mut session = match Session::new(size, seed) {
            Ok(session) => session.with_logger(logger),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        };

        let mut agent = kind.build(&config, table, seed);
        session.run(agent.as_mut(), episodes, max_ticks);

        if let Some(table) = agent.table() {
            if let Err(e) = persistence::save_table(&config.persistence.directory, size, table) {
                error!("Failed to save Q-table: {}", e);
            }
        }
        session.histogram().clone()
    } else {
        // Independent episodes, one single-threaded session each
        let sessions: Result<Vec<Session>, SnakeError> = (0..episodes)
            .into_par_iter()
            .map(|episode| -> Result<Session, SnakeError> {
                let episode_seed = seed.map(|s| s.wrapping_add(episode as u64));
                let mut session = Session::new(size, episode_seed)?
                    .with_logger(logger.clone())
                    .starting_at(episode);
                let mut agent = kind.build(&config, QTable::new(), episode_seed);
                session.run_episode(agent.as_mut(), max_ticks);
                Ok(session)
            })
            .collect();

        match sessions {
            Ok(sessions) => merge_histograms(sessions.iter().map(Session::histogram)),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    };

    info!("Score histogram (score: episodes)");
    for (score, count) in &histogram {
        info!("  {:>3}: {}", score, count);
    }
    let total: usize = histogram.values().sum();
    let points: u64 = histogram
        .iter()
        .map(|(score, count)| *score as u64 * *count as u64)
        .sum();
    if total > 0 {
        info!("Average score: {:.2}", points as f64 / total as f64);
    }
}
