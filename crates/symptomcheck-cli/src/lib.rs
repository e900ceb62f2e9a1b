//! symptomcheck CLI library
//!
//! **Version**: 0.1.0
//!
//! The `symptomcheck` binary is a thin wrapper around this library so the
//! pipeline can be driven from tests and other Rust code:
//!
//! ```rust,no_run
//! use symptomcheck_cli::{config::Config, pipeline};
//!
//! let config = Config::load_default()?;
//! let report = pipeline::run(&config)?;
//! for (query, record) in &report.predictions {
//!     println!("{}: {}", query, record.final_prediction);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Module Overview
//!
//! - [`config`]: `.symptomcheckrc` loading and model settings
//! - [`pipeline`]: load, balance, cross-validate, train and predict
//! - [`output`]: colored text and JSON reports

pub mod config;
pub mod output;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{run, run_on_dataset, ModelAccuracy, PipelineReport};
