use std::process;

use tracing::info;

use miniblog::config::{self, Config};
use miniblog::core::db::ConnectionManager;
use miniblog::core::{MiniblogError, Result};
use miniblog::demo;

fn main() {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        eprintln!("miniblog: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    // An optional first argument names a TOML configuration file
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    info!("Starting miniblog against '{}'", config.database.database);

    let shared = ConnectionManager::instance(&config.database)?;
    {
        let mut handle = shared.lock().map_err(|_| {
            MiniblogError::App("Failed to acquire connection handle lock".to_string())
        })?;
        demo::run(&mut handle, &config.demo_options())?;
    }

    drop(shared);
    ConnectionManager::close();
    Ok(())
}
