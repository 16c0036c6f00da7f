//! Counter Board
//!
//! Layered architecture:
//! - counter_core: entities, entity store and ordering engine
//! - commands: handlers the shell (or any other front end) calls
//! - session: drag state and cancellable drop tasks
//! - shell: line-oriented front end

use std::path::Path;
use std::sync::Arc;

use counter_core::{init_db, OrderingEngine};
use tokio::io::{AsyncBufReadExt, BufReader};

pub mod commands;
pub mod config;
pub mod session;
pub mod shell;

use config::AppConfig;
use session::InteractionSession;
use shell::{Command, Flow};

/// Application state shared across commands
pub struct AppState {
    pub engine: Arc<OrderingEngine>,
    pub config: AppConfig,
}

impl AppState {
    /// Open the database named by the config and build the engine
    pub async fn open(config: AppConfig) -> Result<Self, String> {
        if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }
        let store = init_db(Path::new(&config.db_path))
            .await
            .map_err(|e| e.to_string())?;
        Ok(Self {
            engine: Arc::new(OrderingEngine::new(Arc::new(store))),
            config,
        })
    }
}

/// Load config, start logging, repair orderings, then serve stdin
pub async fn run() -> Result<(), String> {
    let config = AppConfig::load()?;
    rolling_logger::init_logger_with(
        config.log_dir.clone(),
        &config.app_name,
        config.log_capacity,
        config.log_level(),
    )?;

    let state = AppState::open(config).await?;
    let repaired = commands::repair_orders(&state).await?;
    if repaired > 0 {
        log::warn!("Startup repair renumbered {} entities", repaired);
    }
    log::info!("Board ready ({})", state.config.db_path.display());

    let mut session = InteractionSession::new(state.engine.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", shell::HELP);

    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match shell::execute(&state, &session, command).await {
            Ok(Flow::Continue(reply)) => println!("{}", reply),
            Ok(Flow::Quit) => break,
            Err(e) => {
                log::warn!("Command failed: {}", e);
                eprintln!("error: {}", e);
            }
        }
    }

    session.close();
    log::info!("Board closed");
    Ok(())
}
