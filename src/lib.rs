pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod local_storage;
pub mod models;
pub mod pnl;
pub mod state;
pub mod store;
pub mod sync;

use std::sync::Arc;

use cli::{Cli, Commands};
use config::AppConfig;
use state::AppState;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    log::debug!("Data directory: {:?}", config.data_dir);

    let state = Arc::new(AppState::initialize(config)?);

    match cli.command {
        Commands::Shell => cli::shell::run(state).await,
        command => {
            cli::run::execute(&state, command).await?;
            Ok(())
        }
    }
}
