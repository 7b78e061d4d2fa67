mod app_dir;
mod commands;
mod config;
mod controller;
mod error;

use std::io::{self, BufRead};
use std::process::ExitCode;

use tracing::{error, info, warn};

use commands::{parse_command, Command};
use config::AppConfig;
use controller::Controller;
use error::AppError;

fn run() -> Result<(), AppError> {
    let config = AppConfig::load().validate()?;
    info!(
        width = config.width,
        height = config.height,
        workers = config.num_workers,
        mapping = config.color_mapping.label(),
        "Starting MandelTile"
    );

    let mut controller = Controller::new(&config)?;
    let stats = controller.wait_for_frame(config.frame_timeout());
    info!(?stats, "Initial frame ready");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        match command {
            Command::Event(event) => match controller.handle(event) {
                Ok(true) => {
                    let stats = controller.wait_for_frame(config.frame_timeout());
                    let view = controller.view();
                    info!(
                        ?event,
                        ?stats,
                        x_center = view.x_center,
                        y_center = view.y_center,
                        x_range = view.x_range,
                        history = controller.history_len(),
                        "Frame ready"
                    );
                }
                Ok(false) => {}
                Err(e) => warn!(?event, "Event rejected: {e}"),
            },
            Command::Save(path) => {
                if let Err(e) = controller.export(&path) {
                    error!("{e}");
                }
            }
            Command::Quit => break,
        }
    }

    controller.pump();
    if controller.pending() > 0 {
        warn!(
            generation = controller.generation(),
            pending = controller.pending(),
            "Exiting with tiles still in flight"
        );
    }
    let surface = controller.surface();
    info!(
        width = surface.width,
        height = surface.height,
        stats = ?controller.stats(),
        "Session finished"
    );
    if let Some(path) = &config.output {
        controller.export(path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
