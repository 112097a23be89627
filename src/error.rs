use thiserror::Error;

/// Problems found while resolving an instance's companion files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    /// The capacity file `TP<n>.csv` does not exist.
    #[error("TPFileNotFound")]
    CapacityFileNotFound,
}

/// Terminal failure states of the one-shot build of the compiled solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A stale artifact could not be removed before building.
    #[error("ErrorRemovingOldLinuxBinary: {0}")]
    StaleArtifact(String),
    /// One or more source files are missing.
    #[error("CppSourceMissing: {0:?}")]
    SourceMissing(Vec<String>),
    /// The compiler ran and reported errors.
    #[error("CompilationFailed: {0}")]
    CompilationFailed(String),
    /// The compiler did not finish in time.
    #[error("CompilationTimeout")]
    Timeout,
    /// The compiler executable could not be found.
    #[error("CompilerNotFound({0})")]
    CompilerNotFound(String),
    /// Anything else that went wrong while building.
    #[error("CppCompileException: {0}")]
    Exception(String),
}

/// Failures of a single solver invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    /// The interpreted solver exited with a non-zero code.
    #[error("PythonError")]
    InterpretedFailed { code: i32, detail: String },
    /// The interpreted solver hit its wall-clock limit.
    #[error("Timeout")]
    InterpretedTimeout,
    /// The interpreter or the solver script could not be found.
    #[error("PythonNotFound")]
    InterpreterNotFound,
    /// Any other failure around the interpreted solver.
    #[error("PythonException")]
    InterpretedException(String),
    /// The build failed; holds the shortened build message.
    #[error("{0}")]
    BuildUnavailable(String),
    /// The compiled artifact vanished or lost its execute bit after the build.
    #[error("CppExeMissingOrNotExecAtRuntime")]
    ExecutableMissing,
    /// The compiled solver could not open its input files.
    #[error("CppFileOpenError")]
    FileOpen(String),
    /// The compiled solver exited with a non-zero code.
    #[error("CppErrorReturn{code}")]
    CompiledFailed { code: i32, detail: String },
    /// The OS refused to start the compiled solver.
    #[error("CppOSError_e{errno}")]
    CompiledOs { errno: i32, detail: String },
    /// The compiled solver hit its wall-clock limit.
    #[error("CppTimeout")]
    CompiledTimeout,
    /// Any other failure around the compiled solver.
    #[error("CppRunException")]
    CompiledException(String),
}

/// Parse failures of a ground-truth solution file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimalParseError {
    #[error("ErrorOptimal_EmptyLine")]
    EmptyLine,
    #[error("ErrorOptimal_SingleLine2PartNonNumeric")]
    SingleLine2PartNonNumeric,
    #[error("ErrorOptimal_SingleLine1PartNonNumeric")]
    SingleLine1PartNonNumeric,
    #[error("ErrorOptimal_SingleLine3PartNonNumeric")]
    SingleLine3PartNonNumeric,
    #[error("ErrorOptimal_SingleLineUnrecognizedParts")]
    SingleLineUnrecognizedParts,
    #[error("ErrorOptimal_PalletList_NonNumeric")]
    PalletListNonNumeric,
    #[error("ErrorOptimal_MixedFormat")]
    MixedFormat,
    /// 1-based line number of the first line without three fields.
    #[error("ErrorOptimal_Line{0}_Not3Parts")]
    LineNot3Parts(usize),
    #[error("ErrorOptimal_UnknownFormatOrStructure")]
    UnknownFormatOrStructure,
    /// The file exists but could not be read.
    #[error("ErrorReadingOptimalFile")]
    Unreadable(String),
    /// The file does not exist (or held nothing to parse).
    #[error("OptFileNotFound")]
    FileNotFound,
}

/// Fields that could not be recovered from a solver's standard output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputParseError {
    #[error("NoProfitInOutput")]
    NoProfit,
    #[error("NoWeightInOutput")]
    NoWeight,
    #[error("NoPalletLineInOutput")]
    NoPalletLine,
    #[error("ErrorParsingProfit")]
    MalformedProfit,
    #[error("ErrorParsingWeight")]
    MalformedWeight,
    #[error("ErrorParsingPallets")]
    MalformedPallets,
    /// No known grammar matched; carries an excerpt of the raw output.
    #[error("CppNoOutputPattern")]
    NoOutputPattern(String),
    /// Profit or weight was found but no item list grammar matched.
    #[error("CppPalletsNotParsedGeneric")]
    PalletsNotParsed,
    /// A grammar matched but its numbers did not convert.
    #[error("CppParseError_MatchNum")]
    MatchedNonNumeric,
}

/// Placeholder carried in a result cell instead of a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorTag {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error(transparent)]
    Optimal(#[from] OptimalParseError),
    #[error(transparent)]
    Output(#[from] OutputParseError),
}

impl ErrorTag {
    /// Diagnostic payload kept next to the tag, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ErrorTag::Invocation(err) => match err {
                InvocationError::InterpretedFailed { code, detail } => {
                    Some(format!("ReturnCode{code}_{detail}"))
                }
                InvocationError::InterpretedException(detail)
                | InvocationError::CompiledException(detail)
                | InvocationError::CompiledOs { detail, .. } => {
                    Some(detail.clone())
                }
                InvocationError::FileOpen(detail)
                | InvocationError::CompiledFailed { detail, .. } => {
                    Some(format!("Err: {detail}"))
                }
                _ => None,
            },
            ErrorTag::Optimal(OptimalParseError::Unreadable(detail)) => {
                Some(detail.clone())
            }
            ErrorTag::Output(OutputParseError::NoOutputPattern(excerpt)) => {
                Some(format!("Output: {excerpt}..."))
            }
            _ => None,
        }
    }

    /// The tag followed by its detail, as written to the selected-items cell.
    pub fn describe(&self) -> String {
        match self.detail() {
            Some(detail) => format!("{self}: {detail}"),
            None => self.to_string(),
        }
    }
}

/// Shorten a diagnostic to `limit` characters and flatten it onto one line.
pub fn truncate_detail(text: &str, limit: usize) -> String {
    text.chars()
        .take(limit)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_render_original_names() {
        let tag: ErrorTag = InvocationError::CompiledOs {
            errno: 8,
            detail: "Exec format error".into(),
        }
        .into();
        assert_eq!(tag.to_string(), "CppOSError_e8");
        assert_eq!(tag.describe(), "CppOSError_e8: Exec format error");
        let tag: ErrorTag = OptimalParseError::LineNot3Parts(2).into();
        assert_eq!(tag.to_string(), "ErrorOptimal_Line2_Not3Parts");
        assert_eq!(tag.detail(), None);
    }

    #[test]
    fn test_build_errors_carry_detail_in_tag() {
        let tag: ErrorTag =
            BuildError::CompilationFailed("undefined reference".into()).into();
        assert_eq!(tag.to_string(), "CompilationFailed: undefined reference");
        assert_eq!(tag.describe(), tag.to_string());
    }

    #[test]
    fn test_truncate_detail() {
        assert_eq!(truncate_detail("line one\nline two", 12), "line one lin");
        assert_eq!(truncate_detail("short", 100), "short");
    }
}
