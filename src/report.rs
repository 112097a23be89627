use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use log::{error, info};
use polars::prelude::*;

use crate::datastructures::ExecutionResult;

/// Report columns, in order.
pub const COLUMNS: [&str; 8] = [
    "method_name",
    "problem_id",
    "runtime",
    "profit_achieved",
    "optimal_profit",
    "weight_achieved",
    "optimal_weight",
    "selected_pallets",
];

/// All rows as a frame of text columns, one column per report field.
pub fn results_to_dataframe(results: &[ExecutionResult]) -> Result<DataFrame> {
    let mut columns: [Vec<String>; 8] = Default::default();
    for record in results.iter().map(ExecutionResult::to_record) {
        for (column, cell) in columns.iter_mut().zip(record) {
            column.push(cell);
        }
    }
    let series = COLUMNS
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name, values))
        .collect::<Vec<_>>();
    Ok(DataFrame::new(series)?)
}

/// Write the report as csv; the header is written even without rows.
pub fn write_report(path: &Path, results: &[ExecutionResult]) -> Result<()> {
    let mut df = results_to_dataframe(results)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create {path:?}"))?;
    CsvWriter::new(&mut file)
        .has_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {path:?}"))?;
    Ok(())
}

/// Write the report, or print it to stdout if the file cannot be written.
pub fn save_report(path: &Path, results: &[ExecutionResult]) -> Result<()> {
    match write_report(path, results) {
        Ok(()) => {
            info!("Results successfully written to {path:?}");
            Ok(())
        }
        Err(err) => {
            error!(
                "Error writing results to {path:?}: {err:#}. Displaying to stdout instead:"
            );
            let mut df = results_to_dataframe(results)?;
            CsvWriter::new(io::stdout().lock())
                .has_header(true)
                .finish(&mut df)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastructures::*;
    use crate::error::{InvocationError, SetupError};

    fn rows() -> Vec<ExecutionResult> {
        vec![
            ExecutionResult::from_outcome(
                Method::SetupError,
                "P1".into(),
                OptimalSolution::missing(),
                RunOutcome::failed(Runtime::NotRun, SetupError::CapacityFileNotFound),
            ),
            ExecutionResult::from_outcome(
                Method::InterpretedSolver,
                "P2".into(),
                OptimalSolution::new(30.0, Metric::NotAvailable),
                RunOutcome {
                    runtime: Runtime::Seconds(1.25),
                    profit: Metric::Value(30.0),
                    weight: Metric::Value(12.0),
                    selection: Selection::Items(vec![1, 4, 6]),
                },
            ),
            ExecutionResult::from_outcome(
                Method::CompiledSolver,
                "P2".into(),
                OptimalSolution::new(30.0, Metric::NotAvailable),
                RunOutcome::failed(
                    Runtime::Seconds(300.0),
                    InvocationError::CompiledTimeout,
                ),
            ),
        ]
    }

    #[test]
    fn test_dataframe_layout() {
        let df = results_to_dataframe(&rows()).unwrap();
        assert_eq!(df.shape(), (3, 8));
        assert_eq!(df.get_column_names(), COLUMNS.to_vec());
        let runtime = df.column("runtime").unwrap().utf8().unwrap();
        assert_eq!(runtime.get(0), Some("0"));
        assert_eq!(runtime.get(1), Some("1.2500"));
        let pallets = df.column("selected_pallets").unwrap().utf8().unwrap();
        assert_eq!(pallets.get(1), Some("1,4,6"));
        assert_eq!(pallets.get(2), Some("CppTimeout"));
        let optimal_weight = df.column("optimal_weight").unwrap().utf8().unwrap();
        assert_eq!(optimal_weight.get(1), Some("N/A"));
    }

    #[test]
    fn test_header_only_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("performance_results.csv");
        write_report(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].replace('"', ""), COLUMNS.join(","));
    }

    #[test]
    fn test_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.csv");
        save_report(&path, &rows()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        let df = CsvReader::from_path(&path)
            .unwrap()
            .has_header(true)
            .finish()
            .unwrap();
        assert_eq!(df.shape(), (3, 8));
        for column in df.get_columns() {
            assert_eq!(column.null_count(), 0, "empty cell in {}", column.name());
        }
    }

    #[test]
    fn test_unwritable_path_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("results.csv");
        assert!(write_report(&path, &rows()).is_err());
        assert!(save_report(&path, &rows()).is_ok());
    }
}
