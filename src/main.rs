use std::{fs::OpenOptions, io, sync::Mutex};

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod constants;
mod domain;
mod engine;
mod notify;
mod settings;
mod storage;

use cli::Cli;
use storage::DataPaths;

const LOG_ENV: &str = "DAYBLOCKS_LOG";

/// Logs go to a file so they never land on top of the terminal UI.
fn init_logging(paths: &DataPaths) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = std::fs::create_dir_all(&paths.state_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.log_file())
    });

    match log_file {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        Err(_) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let paths = DataPaths::resolve(cli.data_dir.clone());
    init_logging(&paths);

    match cli.command {
        Some(command) => {
            cli::run_command(command, &paths);
            Ok(())
        }
        None => app::run_ui(paths, cli.mute),
    }
}
