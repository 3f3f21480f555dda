//! SetuRelay daemon - TCP command relay for robot fleets
//!
//! Runs one TCP listener per configured `[[listener]]` block. Robots
//! connect to a listener; operators broadcast command frames through the
//! library API. The daemon runs until SIGINT/SIGTERM, then stops every
//! listener, closing all live connections.

use setu_relay::{Config, Error, RelayServer, Result, StartStatus};
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Config path used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "/etc/setu-relay.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `setu-relay <path>` (positional)
/// - `setu-relay --config <path>` (flag-based)
/// - `setu-relay -c <path>` (short flag)
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    DEFAULT_CONFIG_PATH.to_string()
}

fn load_config(path: &str) -> Result<(Config, bool)> {
    if Path::new(path).exists() {
        return Ok((Config::from_file(path)?, true));
    }
    // A missing default path falls back to built-in defaults; a missing
    // explicit path is an error.
    if path == DEFAULT_CONFIG_PATH {
        return Ok((Config::defaults(), false));
    }
    Err(Error::Config(format!("Config file not found: {}", path)))
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let (mut config, from_file) = load_config(&config_path)?;
    config.apply_env_overrides()?;

    // RUST_LOG wins over the configured default level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("SetuRelay v{} starting...", env!("CARGO_PKG_VERSION"));
    if from_file {
        log::info!("Using config: {}", config_path);
    } else {
        log::info!("No config at {}, using built-in defaults", config_path);
    }

    let servers: Vec<RelayServer> = config
        .listeners
        .iter()
        .cloned()
        .map(RelayServer::new)
        .collect();

    let mut started = 0;
    for server in &servers {
        match server.start() {
            Ok(StartStatus::Started) => started += 1,
            Ok(StartStatus::AlreadyRunning) => {}
            // A bind failure is fatal for that listener only
            Err(e) => log::error!("Listener failed to start: {}", e),
        }
    }
    if started == 0 {
        return Err(Error::Config("no listener could be started".to_string()));
    }

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Config(format!("Error setting Ctrl-C handler: {}", e)))?;

    log::info!("SetuRelay running. Press Ctrl-C to stop.");

    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(200));
    }

    log::info!("Shutting down...");
    for server in &servers {
        server.stop();
    }

    log::info!("SetuRelay stopped");
    Ok(())
}
