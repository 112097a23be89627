use std::{io, path::Path, path::PathBuf, time::Duration};

use log::error;

use crate::build::{BuildOutcome, BuildStatus};
use crate::datastructures::{Method, ProblemInstance, RunOutcome, Runtime};
use crate::error::{truncate_detail, InvocationError};
use crate::output_parser::{parse_compiled_output, parse_interpreted_output, ParsedOutput};
use crate::process::{CapturedOutput, Invocation, ProcessError, Spawn};

/// Marker the compiled solver prints when it cannot read its inputs.
const FILE_OPEN_MARKER: &str = "Error opening file";

/// Runs one solver implementation against one instance.
///
/// Implementations never fail: every problem ends up as an error tag in the
/// returned [`RunOutcome`].
pub trait SolverRunner {
    fn method(&self) -> Method;

    fn run(&self, instance: &ProblemInstance) -> RunOutcome;
}

fn parsed(runtime: Runtime, parsed: ParsedOutput) -> RunOutcome {
    RunOutcome {
        runtime,
        profit: parsed.profit,
        weight: parsed.weight,
        selection: parsed.selection,
    }
}

fn seconds(output: &CapturedOutput) -> Runtime {
    Runtime::Seconds(output.elapsed.as_secs_f64())
}

/// Runs `<interpreter> <script> <capacity-file> <item-file>`.
pub struct InterpretedRunner<'a> {
    pub interpreter: PathBuf,
    pub script: PathBuf,
    pub timeout: Duration,
    pub spawner: &'a dyn Spawn,
}

impl SolverRunner for InterpretedRunner<'_> {
    fn method(&self) -> Method {
        Method::InterpretedSolver
    }

    fn run(&self, instance: &ProblemInstance) -> RunOutcome {
        let problem_id = instance.id();
        let invocation = Invocation::new(&self.interpreter)
            .arg(self.script.as_os_str())
            .arg(instance.capacity_file.as_os_str())
            .arg(instance.item_file.as_os_str());
        match self.spawner.run(&invocation, self.timeout) {
            Ok(output) if output.success() => {
                parsed(seconds(&output), parse_interpreted_output(&output.stdout))
            }
            Ok(output) => {
                let code = output.exit_code();
                error!(
                    "Error running {:?} for {problem_id} (RC {code}): {}",
                    self.script,
                    truncate_detail(output.diagnostic(), 250)
                );
                RunOutcome::failed(
                    seconds(&output),
                    InvocationError::InterpretedFailed {
                        code,
                        detail: truncate_detail(output.diagnostic(), 50),
                    },
                )
            }
            Err(ProcessError::TimedOut(limit)) => {
                error!("Timeout running {:?} for {problem_id} after {limit:?}", self.script);
                RunOutcome::failed(
                    Runtime::Seconds(limit.as_secs_f64()),
                    InvocationError::InterpretedTimeout,
                )
            }
            Err(ProcessError::Spawn(err)) if err.kind() == io::ErrorKind::NotFound => {
                error!(
                    "Interpreter {:?} or script {:?} not found for {problem_id}",
                    self.interpreter, self.script
                );
                RunOutcome::failed(Runtime::NotRun, InvocationError::InterpreterNotFound)
            }
            Err(err) => {
                error!("Exception running {:?} for {problem_id}: {err}", self.script);
                RunOutcome::failed(
                    Runtime::NotRun,
                    InvocationError::InterpretedException(truncate_detail(
                        &err.to_string(),
                        100,
                    )),
                )
            }
        }
    }
}

/// Runs `<artifact> <capacity-file> <item-file>` if the build succeeded.
pub struct CompiledRunner<'a> {
    pub build: &'a BuildStatus,
    pub timeout: Duration,
    pub spawner: &'a dyn Spawn,
}

impl SolverRunner for CompiledRunner<'_> {
    fn method(&self) -> Method {
        Method::CompiledSolver
    }

    fn run(&self, instance: &ProblemInstance) -> RunOutcome {
        let problem_id = instance.id();
        if let BuildOutcome::Failed(err) = &self.build.outcome {
            return RunOutcome::failed(
                Runtime::NotRun,
                InvocationError::BuildUnavailable(truncate_detail(
                    &err.to_string(),
                    100,
                )),
            );
        }

        let executable = &self.build.executable;
        if !is_executable(executable) {
            error!(
                "C++ executable {executable:?} missing or not executable at runtime for {problem_id}"
            );
            return RunOutcome::failed(Runtime::NotRun, InvocationError::ExecutableMissing);
        }

        let invocation = Invocation::new(executable)
            .arg(instance.capacity_file.as_os_str())
            .arg(instance.item_file.as_os_str());
        match self.spawner.run(&invocation, self.timeout) {
            Ok(output) if output.success() => {
                parsed(seconds(&output), parse_compiled_output(&output.stdout))
            }
            Ok(output) => {
                let detail = truncate_detail(output.diagnostic(), 200);
                if detail.contains(FILE_OPEN_MARKER) {
                    error!("C++: Reported error opening input files for {problem_id}: {detail}");
                    return RunOutcome::failed(seconds(&output), InvocationError::FileOpen(detail));
                }
                let code = output.exit_code();
                error!("Error running C++ for {problem_id} (RC {code}): {detail}");
                RunOutcome::failed(
                    seconds(&output),
                    InvocationError::CompiledFailed { code, detail },
                )
            }
            Err(ProcessError::TimedOut(limit)) => {
                error!("Timeout running C++ for {problem_id} after {limit:?}");
                RunOutcome::failed(
                    Runtime::Seconds(limit.as_secs_f64()),
                    InvocationError::CompiledTimeout,
                )
            }
            Err(ProcessError::Spawn(err)) => {
                let errno = err.raw_os_error().unwrap_or(-1);
                let detail = truncate_detail(&err.to_string(), 100);
                error!("OSError running C++ for {problem_id} (errno {errno}): {detail}");
                RunOutcome::failed(
                    Runtime::NotRun,
                    InvocationError::CompiledOs { errno, detail },
                )
            }
            Err(err) => {
                error!("Exception running C++ for {problem_id}: {err}");
                RunOutcome::failed(
                    Runtime::NotRun,
                    InvocationError::CompiledException(truncate_detail(
                        &err.to_string(),
                        100,
                    )),
                )
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
