use std::{fs, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use log::{info, warn};
use polars::prelude::*;

use pallet_bench::datastructures::ProblemInstance;
use pallet_bench::optimal_solution::read_optimal_solution;
use pallet_bench::orchestrator::discover_instances;

/// Write the ground-truth profit and weight of every instance to a csv file.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory containing the P<n>.csv and OptimalSolution_<n>.txt files
    #[arg(short = 'd', long, default_value = ".")]
    work_dir: PathBuf,
    /// Path of the output csv
    #[arg(short, long, default_value = "optimal_reference.csv")]
    out: PathBuf,
    #[command(flatten)]
    verbosity: Verbosity,
}

fn reference_table(instances: &[ProblemInstance]) -> Result<DataFrame> {
    let mut ids = Vec::with_capacity(instances.len());
    let mut profits = Vec::with_capacity(instances.len());
    let mut weights = Vec::with_capacity(instances.len());
    for instance in instances {
        let optimal = read_optimal_solution(&instance.optimal_file);
        if optimal.is_missing() {
            warn!("No optimal solution for {}", instance.id());
        }
        let optimal = optimal.for_report();
        ids.push(instance.id());
        profits.push(optimal.profit.to_string());
        weights.push(optimal.weight.to_string());
    }
    Ok(df! {
        "problem_id" => ids,
        "optimal_profit" => profits,
        "optimal_weight" => weights,
    }?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let instances = discover_instances(&args.work_dir)?;
    info!("Found {} instances in {:?}", instances.len(), args.work_dir);
    let mut table = reference_table(&instances)?;
    let mut file = fs::File::create(&args.out)?;
    CsvWriter::new(&mut file).finish(&mut table)?;
    Ok(())
}
