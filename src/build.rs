use std::{fs, io, path::Path, path::PathBuf, time::Duration};

use log::{error, info, warn};

use crate::error::{truncate_detail, BuildError};
use crate::process::{Invocation, ProcessError, Spawn};

/// Everything needed to build the compiled solver.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub compiler: PathBuf,
    pub sources: Vec<PathBuf>,
    pub executable: PathBuf,
    pub flags: Vec<String>,
    pub timeout: Duration,
}

impl BuildPlan {
    fn invocation(&self) -> Invocation {
        Invocation::new(&self.compiler)
            .args(self.sources.iter().map(|s| s.as_os_str().to_owned()))
            .arg("-o")
            .arg(self.executable.as_os_str())
            .args(self.flags.iter().map(String::as_str))
    }
}

/// Terminal state of the build.
///
/// Before the build has run there is no [`BuildStatus`] at all, so runners
/// can only ever observe one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Succeeded,
    Failed(BuildError),
}

/// Result of the single build attempt of a harness run.
///
/// Created once before the first instance is processed and only read
/// afterwards; runners receive it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildStatus {
    pub executable: PathBuf,
    pub outcome: BuildOutcome,
}

impl BuildStatus {
    /// An executable that is taken as already built.
    pub fn prebuilt(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            outcome: BuildOutcome::Succeeded,
        }
    }

    pub fn failed(executable: impl Into<PathBuf>, err: BuildError) -> Self {
        Self {
            executable: executable.into(),
            outcome: BuildOutcome::Failed(err),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == BuildOutcome::Succeeded
    }

    pub fn message(&self) -> String {
        match &self.outcome {
            BuildOutcome::Succeeded => "CompilationSuccessful".to_string(),
            BuildOutcome::Failed(err) => err.to_string(),
        }
    }
}

/// Build the compiled solver exactly once.
///
/// Stale artifacts are removed first, then the sources are checked and the
/// compiler is invoked. Whatever happens is recorded in the returned status;
/// there is no retry.
pub fn build_once(plan: &BuildPlan, spawner: &dyn Spawn) -> BuildStatus {
    let outcome = match compile(plan, spawner) {
        Ok(()) => {
            info!(
                "C++ compilation successful. Executable at {:?}",
                plan.executable
            );
            BuildOutcome::Succeeded
        }
        Err(err) => {
            error!("C++ build failed: {err}");
            BuildOutcome::Failed(err)
        }
    };
    BuildStatus {
        executable: plan.executable.clone(),
        outcome,
    }
}

fn compile(plan: &BuildPlan, spawner: &dyn Spawn) -> Result<(), BuildError> {
    remove_stale_artifacts(&plan.executable)?;

    let missing = plan
        .sources
        .iter()
        .filter(|source| !source.exists())
        .map(|source| source.display().to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(BuildError::SourceMissing(missing));
    }

    let invocation = plan.invocation();
    info!("Attempting initial C++ compilation: {}", invocation.display());
    let output = spawner
        .run(&invocation, plan.timeout)
        .map_err(|err| match err {
            ProcessError::TimedOut(_) => BuildError::Timeout,
            ProcessError::Spawn(err) if err.kind() == io::ErrorKind::NotFound => {
                BuildError::CompilerNotFound(
                    plan.compiler.display().to_string(),
                )
            }
            other => BuildError::Exception(truncate_detail(&other.to_string(), 200)),
        })?;
    if !output.success() {
        return Err(BuildError::CompilationFailed(truncate_detail(
            &output.stderr,
            500,
        )));
    }
    make_executable(&plan.executable)
        .map_err(|err| BuildError::Exception(truncate_detail(&err.to_string(), 200)))
}

/// Remove previous build outputs, including a Windows-style `.exe` twin.
fn remove_stale_artifacts(executable: &Path) -> Result<(), BuildError> {
    let mut windows_style = executable.as_os_str().to_owned();
    windows_style.push(".exe");
    let windows_style = PathBuf::from(windows_style);
    if windows_style.exists() {
        match fs::remove_file(&windows_style) {
            Ok(()) => info!("Removed existing Windows-style exe: {windows_style:?}"),
            Err(err) => warn!("Could not remove {windows_style:?}: {err}"),
        }
    }
    if executable.exists() {
        fs::remove_file(executable)
            .map_err(|err| BuildError::StaleArtifact(err.to_string()))?;
        info!("Removed existing executable {executable:?} for fresh compile");
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> io::Result<()> {
    fs::metadata(path).map(|_| ())
}
