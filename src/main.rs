//! tubeqa CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubeqa::cli::commands::{self, ReportedError};
use tubeqa::cli::{Cli, Commands};
use tubeqa::config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        // Already shown to the user by the command.
        Err(e) => match e.downcast_ref::<ReportedError>() {
            Some(reported) => ExitCode::from(reported.exit_code()),
            None => {
                eprintln!("Error: {:?}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let settings = Settings::load_from(cli.config.as_deref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubeqa={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Ask {
            url,
            question,
            no_sources,
        } => {
            commands::run_ask(url, question, *no_sources, settings).await?;
        }

        Commands::Index { url } => {
            commands::run_index(url, settings).await?;
        }

        Commands::Search { url, query } => {
            commands::run_search(url, query, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }
    }

    Ok(())
}
