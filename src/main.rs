//! `dockedup`: a live, htop-style terminal dashboard for Docker Compose stacks.

mod actions;
mod app_error;
mod app_state;
mod config;
mod container_api;
mod formatters;
mod input;
mod model;
mod monitor;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use app_error::AppError;
use config::{Args, Config};
use container_api::{BollardApi, ContainerApi};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::new(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.disp());
            return ExitCode::FAILURE;
        }
    };

    setup_tracing(config.debug);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::DockerConnect) => {
            eprintln!("{}", AppError::DockerConnect.disp());
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{}", err.disp());
            ExitCode::FAILURE
        }
    }
}

/// `tracing` + `tracing-subscriber` to stderr, `debug` level in `--debug`
/// mode.
fn setup_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("dockedup={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(config: Config) -> Result<(), AppError> {
    let connect = async { BollardApi::connect_with_defaults() };
    let api: Arc<dyn ContainerApi> = tokio::select! {
        result = connect => {
            let api = result.map_err(|_| AppError::DockerConnect)?;
            if api.ping().await.is_err() {
                return Err(AppError::DockerConnect);
            }
            Arc::new(api)
        }
        _ = tokio::signal::ctrl_c() => {
            // Ctrl+C during startup exits with 130.
            std::process::exit(130);
        }
    };

    let monitor = Arc::new(monitor::ContainerMonitor::new(Arc::clone(&api)));
    monitor.run().await.map_err(|_| AppError::DockerConnect)?;

    let app_state = Arc::new(app_state::AppState::new(config.debug));
    let quit = CancellationToken::new();

    let result = ui::run(Arc::clone(&monitor), app_state, api, config.refresh, quit).await;

    monitor.stop().await;
    info!("dockedup exiting");
    result
}
