use core::fmt;
use std::path::PathBuf;

use itertools::Itertools;

use crate::error::{ErrorTag, OptimalParseError};

/// One problem to solve, discovered from an item file named `P<n>.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemInstance {
    /// Numeric part of the item file name, used for ordering.
    pub number: u64,
    /// Digits exactly as they appear in the file name.
    pub digits: String,
    pub item_file: PathBuf,
    pub capacity_file: PathBuf,
    pub optimal_file: PathBuf,
}

impl ProblemInstance {
    /// Report identifier, e.g. `P5`.
    pub fn id(&self) -> String {
        format!("P{}", self.digits)
    }
}

/// Which column of the benchmark a result row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    InterpretedSolver,
    CompiledSolver,
    SetupError,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::InterpretedSolver => "Python_PuLP",
            Method::CompiledSolver => "CPP_Algorithm",
            Method::SetupError => "SetupError",
        };
        write!(f, "{name}")
    }
}

/// A numeric report value, a missing value or an error tag in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    Value(f64),
    NotAvailable,
    Error(ErrorTag),
}

impl Metric {
    pub fn error(tag: impl Into<ErrorTag>) -> Self {
        Metric::Error(tag.into())
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::Value(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) if v.is_finite() && v.fract() == 0.0 => {
                write!(f, "{v:.1}")
            }
            Metric::Value(v) => write!(f, "{v}"),
            Metric::NotAvailable => write!(f, "N/A"),
            Metric::Error(tag) => write!(f, "{tag}"),
        }
    }
}

/// Item identifiers a solver reported as selected.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Items(Vec<i64>),
    Error(ErrorTag),
}

impl Selection {
    pub fn error(tag: impl Into<ErrorTag>) -> Self {
        Selection::Error(tag.into())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Items(items) if items.is_empty() => {
                write!(f, "ErrorOrEmptyPalletList")
            }
            Selection::Items(items) => write!(f, "{}", items.iter().join(",")),
            Selection::Error(tag) => write!(f, "{}", tag.describe()),
        }
    }
}

/// Wall-clock time of a solver run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Runtime {
    Seconds(f64),
    /// No process was started, so there is nothing to time.
    NotRun,
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Seconds(secs) => write!(f, "{secs:.4}"),
            Runtime::NotRun => write!(f, "0"),
        }
    }
}

/// Ground-truth profit and weight of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalSolution {
    pub profit: Metric,
    pub weight: Metric,
}

impl OptimalSolution {
    pub fn new(profit: impl Into<Metric>, weight: impl Into<Metric>) -> Self {
        Self {
            profit: profit.into(),
            weight: weight.into(),
        }
    }

    pub fn failed(tag: impl Into<ErrorTag> + Clone) -> Self {
        Self {
            profit: Metric::error(tag.clone()),
            weight: Metric::error(tag),
        }
    }

    /// Nothing to compare against: the file is absent or empty.
    pub fn missing() -> Self {
        Self {
            profit: Metric::NotAvailable,
            weight: Metric::NotAvailable,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.profit == Metric::NotAvailable
            && self.weight == Metric::NotAvailable
    }

    /// Values as shown next to every solver row of the instance.
    pub fn for_report(self) -> Self {
        if self.is_missing() {
            Self::failed(OptimalParseError::FileNotFound)
        } else {
            self
        }
    }
}

/// What a runner hands back for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub runtime: Runtime,
    pub profit: Metric,
    pub weight: Metric,
    pub selection: Selection,
}

impl RunOutcome {
    /// The same tag in every result field.
    pub fn failed(runtime: Runtime, tag: impl Into<ErrorTag>) -> Self {
        let tag = tag.into();
        Self {
            runtime,
            profit: Metric::Error(tag.clone()),
            weight: Metric::Error(tag.clone()),
            selection: Selection::Error(tag),
        }
    }
}

/// One row of the benchmark report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub method: Method,
    pub problem_id: String,
    pub runtime: Runtime,
    pub profit: Metric,
    pub weight: Metric,
    pub optimal: OptimalSolution,
    pub selection: Selection,
}

impl ExecutionResult {
    pub fn from_outcome(
        method: Method,
        problem_id: String,
        optimal: OptimalSolution,
        outcome: RunOutcome,
    ) -> Self {
        let RunOutcome {
            runtime,
            profit,
            weight,
            selection,
        } = outcome;
        Self {
            method,
            problem_id,
            runtime,
            profit,
            weight,
            optimal,
            selection,
        }
    }

    /// Cells in report column order; blank cells become `N/A`.
    pub fn to_record(&self) -> [String; 8] {
        [
            self.method.to_string(),
            self.problem_id.clone(),
            self.runtime.to_string(),
            self.profit.to_string(),
            self.optimal.profit.to_string(),
            self.weight.to_string(),
            self.optimal.weight.to_string(),
            self.selection.to_string(),
        ]
        .map(|cell| {
            if cell.trim().is_empty() {
                "N/A".to_string()
            } else {
                cell
            }
        })
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for {}: Time={}, P={}, W={}, Pals='{}'",
            self.method,
            self.problem_id,
            self.runtime,
            self.profit,
            self.weight,
            self.selection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvocationError, SetupError};

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::Value(42.0).to_string(), "42.0");
        assert_eq!(Metric::Value(2.5).to_string(), "2.5");
        assert_eq!(Metric::NotAvailable.to_string(), "N/A");
        assert_eq!(
            Metric::error(SetupError::CapacityFileNotFound).to_string(),
            "TPFileNotFound"
        );
    }

    #[test]
    fn test_selection_display() {
        assert_eq!(Selection::Items(vec![1, 2, 3]).to_string(), "1,2,3");
        assert_eq!(
            Selection::Items(vec![]).to_string(),
            "ErrorOrEmptyPalletList"
        );
        assert_eq!(
            Selection::error(InvocationError::CompiledTimeout).to_string(),
            "CppTimeout"
        );
    }

    #[test]
    fn test_missing_optimal_maps_to_not_found() {
        let optimal = OptimalSolution::missing().for_report();
        assert_eq!(optimal.profit.to_string(), "OptFileNotFound");
        assert_eq!(optimal.weight.to_string(), "OptFileNotFound");
        let partial = OptimalSolution::new(7.0, Metric::NotAvailable);
        assert_eq!(partial.clone().for_report(), partial);
    }

    #[test]
    fn test_record_has_no_blank_cells() {
        let row = ExecutionResult {
            method: Method::SetupError,
            problem_id: "P3".into(),
            runtime: Runtime::NotRun,
            profit: Metric::error(SetupError::CapacityFileNotFound),
            weight: Metric::error(SetupError::CapacityFileNotFound),
            optimal: OptimalSolution::missing(),
            selection: Selection::error(SetupError::CapacityFileNotFound),
        };
        let record = row.to_record();
        assert_eq!(record[0], "SetupError");
        assert_eq!(record[2], "0");
        assert_eq!(record[4], "N/A");
        assert!(record.iter().all(|cell| !cell.is_empty()));
    }
}
