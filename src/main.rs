use anyhow::Result;
use clap::Parser;
use log::info;

use pallet_bench::config::{Args, Config};
use pallet_bench::orchestrator;
use pallet_bench::process::SystemSpawner;
use pallet_bench::report;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    let results = orchestrator::run_harness(&config, &SystemSpawner);
    info!("Collected {} result rows", results.len());
    let out = config.resolve(&config.out);
    report::save_report(&out, &results)?;
    Ok(())
}
