//! # DuckDB Pull Test Extension
//!
//! Analyses force-vs-position recordings of repeated pull/clamp test cycles
//! stored in spreadsheets. Each recording holds several runs back to back; a
//! run starts wherever the position returns to exactly zero. For every run
//! the extension reports the average and peak pull force inside a position
//! window given in centimetres.
//!
//! ## Features
//!
//! - **Workbook formats**: Office Open XML (`.xlsx`, `.xlsm`, `.xlam`) and
//!   OpenDocument (`.ods`), detected from the file contents
//! - **Embedded headers**: the header row is found below any title block
//! - **Tolerant loading**: non-numeric cells become missing values and a
//!   broken file never stops the other files of a batch
//! - **Remote files**: URLs are fetched through DuckDB's `read_blob`
//!
//! ## Table Functions
//!
//! - `read_runs`: average and peak pull force per run and file
//! - `analyze_runs`: header position, row and run counts per file
//! - `combine_runs`: per-run means over a group of files
//!
//! The same pipeline is available as a Rust library through [`analysis`].
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

pub mod analysis;
mod database;
pub mod error;
mod extension;
mod helpers;
mod spreadsheet;

#[cfg(test)]
mod fixtures;

use crate::extension::analyze_runs::AnalyzeRunsTableFunction;
use crate::extension::combine_runs::CombineRunsTableFunction;
use crate::extension::read_runs::ReadRunsTableFunction;
use anyhow::{Context, Result};
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use analysis::Options;
pub use analysis::RunResult;
pub use analysis::Source;
pub use analysis::Window;
pub use error::ForceRunsError;

/// Environment variable holding the log filter, e.g. `RUSTY_FORCE_LOG=debug`
pub const LOG_ENV: &str = "RUSTY_FORCE_LOG";

/// Installs a stderr subscriber filtered by [`LOG_ENV`], `warn` by default.
/// A subscriber already installed by the host process is left in place.
fn setup_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init();
}

/// Extension entry point for DuckDB.
///
/// Registers `read_runs`, `analyze_runs` and `combine_runs`.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    setup_logging();
    connection
        .register_table_function::<ReadRunsTableFunction>("read_runs")
        .context("Failed to register read_runs table function")?;
    connection
        .register_table_function::<AnalyzeRunsTableFunction>("analyze_runs")
        .context("Failed to register analyze_runs table function")?;
    connection
        .register_table_function::<CombineRunsTableFunction>("combine_runs")
        .context("Failed to register combine_runs table function")?;
    Ok(())
}
