use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::datastructures::{Metric, Selection};
use crate::error::{truncate_detail, OutputParseError};

/// Values recovered from a solver's standard output. Every field is set,
/// either to a parsed value or to the tag explaining why it is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub profit: Metric,
    pub weight: Metric,
    pub selection: Selection,
}

impl ParsedOutput {
    fn failed(err: OutputParseError) -> Self {
        Self {
            profit: Metric::error(err.clone()),
            weight: Metric::error(err.clone()),
            selection: Selection::error(err),
        }
    }
}

static PY_PROFIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Total Profit: (\S+)").unwrap());
static PY_WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Total Weight: (\S+)").unwrap());
static PY_PALLETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Selected Pallets: \[([^\]]*)\]").unwrap());

/// Parse the output of the interpreted solver.
///
/// Each label is looked up on its own, anywhere in the text:
/// `Total Profit: <v>`, `Total Weight: <v>` and
/// `Selected Pallets: [<id>, <id>, ...]`.
pub fn parse_interpreted_output(output: &str) -> ParsedOutput {
    let labeled_number = |re: &Regex,
                          missing: OutputParseError,
                          malformed: OutputParseError| {
        match re.captures(output) {
            Some(caps) => caps[1]
                .parse::<f64>()
                .map(Metric::Value)
                .unwrap_or_else(|_| Metric::error(malformed)),
            None => Metric::error(missing),
        }
    };
    let profit = labeled_number(
        &PY_PROFIT,
        OutputParseError::NoProfit,
        OutputParseError::MalformedProfit,
    );
    let weight = labeled_number(
        &PY_WEIGHT,
        OutputParseError::NoWeight,
        OutputParseError::MalformedWeight,
    );
    let selection = match PY_PALLETS.captures(output) {
        Some(caps) => caps[1]
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::parse::<i64>)
            .collect::<Result<Vec<_>, _>>()
            .map(Selection::Items)
            .unwrap_or_else(|_| {
                Selection::error(OutputParseError::MalformedPallets)
            }),
        None => Selection::error(OutputParseError::NoPalletLine),
    };
    ParsedOutput {
        profit,
        weight,
        selection,
    }
}

/// A full-result grammar of the compiled solver: profit, weight and the
/// space-separated item list in capture groups 1 to 3.
struct Grammar {
    name: &'static str,
    pattern: Lazy<Regex>,
}

static COMPILED_GRAMMARS: [Grammar; 2] = [
    Grammar {
        name: "solution line",
        pattern: Lazy::new(|| {
            Regex::new(
                r"(?:Exact|Heuristic) solution: Profit = (\d+(?:\.\d+)?), Weight = (\d+(?:\.\d+)?), Pallets = ([\d\s]*)",
            )
            .unwrap()
        }),
    },
    Grammar {
        name: "totals block",
        pattern: Lazy::new(|| {
            Regex::new(
                r"(?i)Total profit:\s*(\d+(?:\.\d+)?)\s*Total weight:\s*(\d+(?:\.\d+)?)\s*Selected pallets \(ID\):\s*([\d\s]*)",
            )
            .unwrap()
        }),
    },
];

static CPP_PROFIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Profit:\s*(\d+(?:\.\d+)?)").unwrap());
static CPP_WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Weight:\s*(\d+(?:\.\d+)?)").unwrap());

fn extract_full_result(caps: &Captures) -> ParsedOutput {
    let profit = caps[1].parse::<f64>();
    let weight = caps[2].parse::<f64>();
    let items = caps[3]
        .split_whitespace()
        .map(str::parse::<i64>)
        .collect::<Result<Vec<_>, _>>();
    match (profit, weight, items) {
        (Ok(profit), Ok(weight), Ok(items)) => ParsedOutput {
            profit: Metric::Value(profit),
            weight: Metric::Value(weight),
            selection: Selection::Items(items),
        },
        _ => ParsedOutput::failed(OutputParseError::MatchedNonNumeric),
    }
}

/// Parse the output of the compiled solver.
///
/// The full-result grammars are tried in order and the first match wins.
/// Without a match, loose `Profit:`/`Weight:` labels are accepted but the
/// item list is then reported as not parsed.
pub fn parse_compiled_output(output: &str) -> ParsedOutput {
    for grammar in COMPILED_GRAMMARS.iter() {
        if let Some(caps) = grammar.pattern.captures(output) {
            log::debug!("Compiled output matched the {} grammar", grammar.name);
            return extract_full_result(&caps);
        }
    }
    let loose_number = |re: &Regex| {
        re.captures(output)
            .and_then(|caps| caps[1].parse::<f64>().ok())
    };
    match (loose_number(&CPP_PROFIT), loose_number(&CPP_WEIGHT)) {
        (None, None) => ParsedOutput::failed(OutputParseError::NoOutputPattern(
            truncate_detail(output, 100),
        )),
        (profit, weight) => ParsedOutput {
            profit: profit
                .map(Metric::Value)
                .unwrap_or_else(|| Metric::error(OutputParseError::NoProfit)),
            weight: weight
                .map(Metric::Value)
                .unwrap_or_else(|| Metric::error(OutputParseError::NoWeight)),
            selection: Selection::error(OutputParseError::PalletsNotParsed),
        },
    }
}
