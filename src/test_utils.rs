use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::process::{CapturedOutput, Invocation, ProcessError, Spawn};

type Script = Box<dyn Fn(&Invocation) -> Result<CapturedOutput, ProcessError>>;

/// A [`Spawn`] that answers from a closure and records every invocation.
pub struct ScriptedSpawner {
    script: Script,
    pub calls: RefCell<Vec<Invocation>>,
    spawned: Cell<usize>,
}

impl ScriptedSpawner {
    pub fn new(
        script: impl Fn(&Invocation) -> Result<CapturedOutput, ProcessError>
            + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: RefCell::new(vec![]),
            spawned: Cell::new(0),
        }
    }

    /// Every invocation exits with `code` and the given output.
    pub fn replying(code: i32, stdout: &str, stderr: &str) -> Self {
        let (stdout, stderr) = (stdout.to_string(), stderr.to_string());
        Self::new(move |_| Ok(captured(code, &stdout, &stderr)))
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.get()
    }
}

impl Spawn for ScriptedSpawner {
    fn run(
        &self,
        invocation: &Invocation,
        _timeout: Duration,
    ) -> Result<CapturedOutput, ProcessError> {
        self.spawned.set(self.spawned.get() + 1);
        self.calls.borrow_mut().push(invocation.clone());
        (self.script)(invocation)
    }
}

pub fn captured(code: i32, stdout: &str, stderr: &str) -> CapturedOutput {
    CapturedOutput {
        code: Some(code),
        signal: None,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        elapsed: Duration::from_millis(5),
    }
}

/// Output of a process that was killed by `signal`.
pub fn signalled(signal: i32, stderr: &str) -> CapturedOutput {
    CapturedOutput {
        code: None,
        signal: Some(signal),
        stdout: String::new(),
        stderr: stderr.to_string(),
        elapsed: Duration::from_millis(5),
    }
}

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[cfg(unix)]
pub fn write_executable(dir: &Path, name: &str, content: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = write_file(dir, name, content);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .unwrap();
    path
}
