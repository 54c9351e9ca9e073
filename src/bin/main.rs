//! arffml command line interface
//!
//! Child process launched by an AutoML orchestrator: fits and/or applies a
//! pipeline on ARFF files and reports the outcome through output files and the
//! exit code.

use arffml::config::{CliArgs, RunConfig};
use arffml::core::Result;
use arffml::{driver, resources};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::process;

fn main() {
    let cli = CliArgs::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    println!("CURRENT_PID:{}", process::id());

    if let Err(e) = run(&cli) {
        error!("Error: {e}");
        process::exit(e.exit_code());
    }
}

fn run(cli: &CliArgs) -> Result<()> {
    let config = RunConfig::from_cli(cli)?;
    resources::apply_process_limits(config.memory_limit)?;

    let outcome = driver::run(&config)?;

    if let Some(path) = &outcome.model_written {
        info!("Model written to {path:?}");
    }
    if let Some(path) = &outcome.predictions_written {
        info!("{} predictions written to {path:?}", outcome.n_predictions);
    }
    Ok(())
}
