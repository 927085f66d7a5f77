// scanmotion_node/src/main.rs

//! The scanmotion process.
//!
//! To run on the built-in simulated scanner:
//! `cargo run --bin scanmotion -- --config config/scanmotion.toml`
//!
//! To replay a recording and keep the reports:
//! `cargo run --bin scanmotion -- --replay recordings/ --json reports.jsonl`

use clap::Parser;
use scanmotion_node::prelude::*;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // `RUST_LOG` overrides the default filter, e.g. `RUST_LOG=scanmotion_core=debug`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<(), NodeError> {
    let mut config = NodeConfig::load(&cli.config)?;
    if let Some(streams) = cli.streams {
        config.simulation.sensors = streams;
    }

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!("Loaded configuration from {:?}", cli.config);
    let summary = run(&config, cli)?;
    info!(
        "Done: {} batches, {} moving objects",
        summary.batches, summary.objects
    );
    Ok(())
}
