use std::{fs, io, path::Path};

use log::warn;

use crate::datastructures::{Metric, OptimalSolution};
use crate::error::{truncate_detail, OptimalParseError};

/// Read a ground-truth file and extract its optimal (profit, weight).
///
/// A missing file yields [`OptimalSolution::missing`], the same as an empty
/// one. Read failures and unparseable content become error tags.
pub fn read_optimal_solution(path: &Path) -> OptimalSolution {
    match fs::read_to_string(path) {
        Ok(content) => parse_optimal_solution(&content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            OptimalSolution::missing()
        }
        Err(err) => {
            warn!("Generic error parsing optimal solution file {path:?}: {err}");
            OptimalSolution::failed(OptimalParseError::Unreadable(
                truncate_detail(&err.to_string(), 100),
            ))
        }
    }
}

/// Parse the content of a ground-truth file.
///
/// Accepted grammars:
/// - `profit,weight` on a single line
/// - `profit` on a single line (weight is not available)
/// - one or more `id,weight,profit` lines, summed up
pub fn parse_optimal_solution(content: &str) -> OptimalSolution {
    match parse_fields(content) {
        Ok(solution) => solution,
        Err(err) => OptimalSolution::failed(err),
    }
}

fn parse_fields(content: &str) -> Result<OptimalSolution, OptimalParseError> {
    let lines: Vec<&str> = content.trim().lines().collect();
    match lines.as_slice() {
        [] => Ok(OptimalSolution::missing()),
        [line] => parse_single_line(line.trim()),
        _ => parse_item_list(&lines),
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}

fn parse_single_line(line: &str) -> Result<OptimalSolution, OptimalParseError> {
    if line.is_empty() {
        return Err(OptimalParseError::EmptyLine);
    }
    match split_fields(line).as_slice() {
        [profit, weight] => match (parse_number(profit), parse_number(weight)) {
            (Some(profit), Some(weight)) => {
                Ok(OptimalSolution::new(profit, weight))
            }
            _ => Err(OptimalParseError::SingleLine2PartNonNumeric),
        },
        [profit] => parse_number(profit)
            .map(|profit| OptimalSolution::new(profit, Metric::NotAvailable))
            .ok_or(OptimalParseError::SingleLine1PartNonNumeric),
        [_id, weight, profit] => {
            match (parse_number(profit), parse_number(weight)) {
                (Some(profit), Some(weight)) => {
                    Ok(OptimalSolution::new(profit, weight))
                }
                _ => Err(OptimalParseError::SingleLine3PartNonNumeric),
            }
        }
        _ => Err(OptimalParseError::SingleLineUnrecognizedParts),
    }
}

fn parse_item_list(lines: &[&str]) -> Result<OptimalSolution, OptimalParseError> {
    let mut total_profit = 0.0;
    let mut total_weight = 0.0;
    let mut accepted = 0_usize;
    for (idx, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match split_fields(line).as_slice() {
            [_id, weight, profit] => {
                match (parse_number(profit), parse_number(weight)) {
                    (Some(profit), Some(weight)) => {
                        total_profit += profit;
                        total_weight += weight;
                        accepted += 1;
                    }
                    _ => return Err(OptimalParseError::PalletListNonNumeric),
                }
            }
            _ if accepted > 0 => return Err(OptimalParseError::MixedFormat),
            _ => return Err(OptimalParseError::LineNot3Parts(idx + 1)),
        }
    }
    if accepted > 0 {
        Ok(OptimalSolution::new(total_profit, total_weight))
    } else {
        Err(OptimalParseError::UnknownFormatOrStructure)
    }
}
