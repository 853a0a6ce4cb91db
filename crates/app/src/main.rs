//! Concierge - hotel room and reservation engine
//!
//! Command-line front desk over the Concierge core. Results are printed to
//! stdout as JSON; logs go to stderr.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod state;

use cli::Cli;
use state::AppState;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let state = match AppState::open(cli.config.as_deref(), cli.database.as_deref()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize store: {}", e);
            eprintln!("concierge: {e}");
            return ExitCode::from(commands::exit_code(&e));
        }
    };
    tracing::debug!(path = %state.db_path.display(), "Store ready");

    match commands::run(&state.db, cli.command) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("concierge: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            if e.is_retryable() {
                tracing::warn!("Write collided with another request: {}", e);
            }
            eprintln!("concierge: {e}");
            ExitCode::from(commands::exit_code(&e))
        }
    }
}
