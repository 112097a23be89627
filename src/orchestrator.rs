use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::build::{build_once, BuildStatus};
use crate::config::Config;
use crate::datastructures::*;
use crate::error::SetupError;
use crate::optimal_solution::read_optimal_solution;
use crate::process::Spawn;
use crate::runner::{CompiledRunner, InterpretedRunner, SolverRunner};

static ITEM_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P(\d+)\.csv$").unwrap());

/// Find all `P<n>.csv` item files in `dir`, ordered by `n`.
///
/// Companion paths are derived from the number; whether they exist is
/// checked later, per instance.
pub fn discover_instances(dir: &Path) -> Result<Vec<ProblemInstance>> {
    let mut instances = Vec::new();
    for entry in dir
        .read_dir()
        .with_context(|| format!("Failed to read instance directory {dir:?}"))?
    {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(caps) = file_name.to_str().and_then(|name| ITEM_FILE.captures(name))
        else {
            continue;
        };
        let digits = caps[1].to_string();
        let Ok(number) = digits.parse::<u64>() else {
            warn!("Could not extract problem ID from {file_name:?}, skipping");
            continue;
        };
        instances.push(ProblemInstance {
            number,
            item_file: entry.path(),
            capacity_file: dir.join(format!("TP{digits}.csv")),
            optimal_file: dir.join(format!("OptimalSolution_{digits:0>2}.txt")),
            digits,
        });
    }
    instances.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.digits.cmp(&b.digits)));
    Ok(instances)
}

/// Process one instance: one setup-error row, or one row per runner.
pub fn process_instance(
    instance: &ProblemInstance,
    runners: &[&dyn SolverRunner],
) -> Vec<ExecutionResult> {
    let problem_id = instance.id();
    if !instance.capacity_file.exists() {
        warn!(
            "Corresponding TP file {:?} not found for {:?}. Skipping {problem_id}.",
            instance.capacity_file, instance.item_file
        );
        return vec![ExecutionResult::from_outcome(
            Method::SetupError,
            problem_id,
            OptimalSolution::missing(),
            RunOutcome::failed(Runtime::NotRun, SetupError::CapacityFileNotFound),
        )];
    }
    info!(
        "Processing problem: {problem_id} (PFile: {:?}, TPFile: {:?})",
        instance.item_file, instance.capacity_file
    );

    let optimal = read_optimal_solution(&instance.optimal_file);
    if optimal.is_missing() {
        warn!("Optimal solution file {:?} not found or empty", instance.optimal_file);
    } else if matches!(optimal.profit, Metric::Error(_)) {
        warn!(
            "Error parsing optimal solution file {:?}: P='{}', W='{}'",
            instance.optimal_file, optimal.profit, optimal.weight
        );
    } else {
        info!(
            "Optimal solution for {problem_id}: Profit={}, Weight={}",
            optimal.profit, optimal.weight
        );
    }
    let optimal = optimal.for_report();

    runners
        .iter()
        .map(|runner| {
            info!("Running {} for {problem_id}...", runner.method());
            let result = ExecutionResult::from_outcome(
                runner.method(),
                problem_id.clone(),
                optimal.clone(),
                runner.run(instance),
            );
            info!("{result}");
            result
        })
        .collect()
}

/// Run every runner against every instance, strictly one after another.
pub fn run_batch(
    instances: &[ProblemInstance],
    runners: &[&dyn SolverRunner],
) -> Vec<ExecutionResult> {
    instances
        .iter()
        .flat_map(|instance| process_instance(instance, runners))
        .collect()
}

/// Build once, then benchmark both solvers on every instance of
/// `config.work_dir`.
pub fn run_harness(config: &Config, spawner: &dyn Spawn) -> Vec<ExecutionResult> {
    let build = if config.skip_build {
        info!("Skipping build, using existing executable {:?}", config.executable);
        BuildStatus::prebuilt(config.resolve(&config.executable))
    } else {
        build_once(&config.build_plan(), spawner)
    };
    if build.succeeded() {
        info!("Initial C++ compilation status: {}", build.message());
    } else {
        warn!(
            "Initial C++ compilation status: {}. Every compiled run will report it.",
            build.message()
        );
    }

    let instances = discover_instances(&config.work_dir).unwrap_or_else(|err| {
        error!("{err:#}");
        vec![]
    });
    if instances.is_empty() {
        warn!("No problem files (P*.csv) found in {:?}", config.work_dir);
        return vec![];
    }
    info!(
        "Found problem files: {}",
        instances.iter().map(|i| i.item_file.display()).join(", ")
    );

    let interpreted = InterpretedRunner {
        interpreter: config.resolve_program(&config.interpreter),
        script: config.resolve(&config.script),
        timeout: Duration::from_secs(config.timeouts.interpreted),
        spawner,
    };
    let compiled = CompiledRunner {
        build: &build,
        timeout: Duration::from_secs(config.timeouts.compiled),
        spawner,
    };
    run_batch(&instances, &[&interpreted, &compiled])
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;
    use crate::build::BuildStatus;
    use crate::error::BuildError;
    use crate::runner::CompiledRunner;
    use crate::test_utils::*;

    struct FixedRunner {
        calls: Cell<usize>,
    }

    impl SolverRunner for FixedRunner {
        fn method(&self) -> Method {
            Method::InterpretedSolver
        }

        fn run(&self, _instance: &ProblemInstance) -> RunOutcome {
            self.calls.set(self.calls.get() + 1);
            RunOutcome {
                runtime: Runtime::Seconds(0.5),
                profit: Metric::Value(10.0),
                weight: Metric::Value(4.0),
                selection: Selection::Items(vec![1]),
            }
        }
    }

    #[test]
    fn test_discovery_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["P10.csv", "P2.csv", "P1.csv", "TP1.csv", "notes.txt", "P3.txt"] {
            write_file(dir.path(), name, "");
        }
        let instances = discover_instances(dir.path()).unwrap();
        let ids = instances.iter().map(ProblemInstance::id).collect::<Vec<_>>();
        assert_eq!(ids, ["P1", "P2", "P10"]);
        assert_eq!(instances[0].capacity_file, dir.path().join("TP1.csv"));
        assert_eq!(
            instances[0].optimal_file,
            dir.path().join("OptimalSolution_01.txt")
        );
        assert_eq!(
            instances[2].optimal_file,
            dir.path().join("OptimalSolution_10.txt")
        );
    }

    #[test]
    fn test_missing_capacity_file_yields_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "P4.csv", "");
        let instances = discover_instances(dir.path()).unwrap();
        let runner = FixedRunner { calls: Cell::new(0) };
        let rows = run_batch(&instances, &[&runner]);
        assert_eq!(runner.calls.get(), 0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].method, Method::SetupError);
        assert_eq!(rows[0].profit.to_string(), "TPFileNotFound");
        assert_eq!(rows[0].weight.to_string(), "TPFileNotFound");
    }

    #[test]
    fn test_rows_share_optimal_reference() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["P1.csv", "TP1.csv", "P2.csv", "TP2.csv"] {
            write_file(dir.path(), name, "");
        }
        write_file(dir.path(), "OptimalSolution_01.txt", "10,4\n");
        let instances = discover_instances(dir.path()).unwrap();
        let first = FixedRunner { calls: Cell::new(0) };
        let second = FixedRunner { calls: Cell::new(0) };
        let rows = run_batch(&instances, &[&first, &second]);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].optimal, OptimalSolution::new(10.0, 4.0));
        assert_eq!(rows[1].optimal, rows[0].optimal);
        assert_eq!(rows[2].optimal.profit.to_string(), "OptFileNotFound");
        assert_eq!(rows[2].optimal.weight.to_string(), "OptFileNotFound");
        assert_eq!(rows[3].problem_id, "P2");
    }

    #[test]
    fn test_failed_build_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["P1.csv", "TP1.csv", "P2.csv", "TP2.csv"] {
            write_file(dir.path(), name, "");
        }
        let spawner = ScriptedSpawner::replying(0, "", "");
        let build = BuildStatus::failed(
            dir.path().join("pallet_optimizer"),
            BuildError::CompilerNotFound("g++".into()),
        );
        let compiled = CompiledRunner {
            build: &build,
            timeout: Duration::from_secs(300),
            spawner: &spawner,
        };
        let instances = discover_instances(dir.path()).unwrap();
        let rows = run_batch(&instances, &[&compiled]);
        assert_eq!(spawner.spawn_count(), 0);
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row.profit.to_string(), "CompilerNotFound(g++)");
            assert_eq!(row.weight.to_string(), "CompilerNotFound(g++)");
            assert_eq!(row.selection.to_string(), "CompilerNotFound(g++)");
        }
    }
}
