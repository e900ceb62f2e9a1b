//! symptomcheck - train the disease classifiers and predict from symptoms
//!
//! Settings come from `.symptomcheckrc`; see [`symptomcheck_cli::config`].

use anyhow::{Context, Result};
use symptomcheck_cli::config::Config;
use symptomcheck_cli::output::{enable_colors, print_error, print_report};
use symptomcheck_cli::pipeline;
use symptomcheck_train::structured_logging::TracingLogger;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::load_default()?;

    enable_colors(config.output.colored);
    TracingLogger::init(config.logging.level, config.logging.format)
        .context("Failed to initialize logging")?;

    let report = pipeline::run(&config)?;
    print_report(&report, &config.output)
}
