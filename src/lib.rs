#![warn(missing_docs)]
//! Benchmark two pallet-packing solvers against known optimal solutions.
//!
//! The harness compiles the C++ solver once, then runs the Python (PuLP)
//! solver and the compiled solver as child processes on every problem
//! instance of a directory. Their free-text output is parsed into profit,
//! weight and selected pallets, paired with the ground truth of the instance
//! and written to a csv report.
//!
//! Nothing here ever aborts the batch: every failure, from a missing
//! companion file to a crashed solver, becomes an error tag inside the
//! affected report cells.
//!
//! Expected files in the working directory:
//! - `P<n>.csv`: pallets of instance `n` (`id,weight,profit`)
//! - `TP<n>.csv`: truck capacity and pallet count of instance `n`
//! - `OptimalSolution_<nn>.txt`: ground truth, `n` zero-padded to 2 digits
//!
//! Example
//! ```rust,no_run
//! use pallet_bench::config::Config;
//! use pallet_bench::orchestrator;
//! use pallet_bench::process::SystemSpawner;
//! use pallet_bench::report;
//! # use anyhow::Result;
//!
//! fn example() -> Result<()> {
//!     let config = Config {
//!         work_dir: "instances".into(),
//!         ..Config::default()
//!     };
//!     let results = orchestrator::run_harness(&config, &SystemSpawner);
//!     report::save_report(&config.resolve(&config.out), &results)?;
//!     Ok(())
//! }
//! ```

/// One-shot build of the compiled solver.
pub mod build;

/// Command line arguments and the json configuration.
pub mod config;

/// Data model of instances, results and report values.
pub mod datastructures;

/// Error tags, grouped by where they originate.
pub mod error;

/// Parser for ground-truth solution files.
pub mod optimal_solution;

/// Instance discovery and the batch loop.
pub mod orchestrator;

/// Parsers for the standard output of both solvers.
pub mod output_parser;

/// Child processes with a wall-clock limit.
pub mod process;

/// Csv report writer.
pub mod report;

/// Runners for the interpreted and the compiled solver.
pub mod runner;

#[cfg(test)]
mod test_utils;
