use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line for log messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a child process that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Signal that terminated the process, if any.
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code, or the negated signal number for a process killed by a
    /// signal.
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => -signal,
            (None, None) => -1,
        }
    }

    /// Standard error, or standard output if nothing was written to stderr.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Why a child process produced no [`CapturedOutput`].
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The process could not be started.
    #[error("failed to start process: {0}")]
    Spawn(#[source] io::Error),
    /// The wall-clock limit elapsed and the process group was killed.
    #[error("process timed out after {0:?}")]
    TimedOut(Duration),
    /// Waiting for the process or collecting its output failed.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),
}

/// Starts child processes with a wall-clock limit.
pub trait Spawn {
    fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<CapturedOutput, ProcessError>;
}

/// Runs invocations as real child processes, each in its own process group.
///
/// The wall-clock limit covers both the leader process and the collection of
/// its output: a background process that keeps the pipes open past the
/// deadline gets its group killed like a leader that never exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl Spawn for SystemSpawner {
    fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<CapturedOutput, ProcessError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        debug!("Spawning: {}", invocation.display());
        let start = Instant::now();
        let deadline = start + timeout;
        let mut child = command.spawn().map_err(ProcessError::Spawn)?;
        let stdout = drain(child.stdout.take(), "stdout");
        let stderr = drain(child.stderr.take(), "stderr");
        let status = wait_until(&mut child, deadline, timeout)?;
        let elapsed = start.elapsed();
        let stdout = receive(&stdout, deadline);
        let stderr = receive(&stderr, deadline);
        kill_group(child.id());
        match (stdout, stderr) {
            (Some(stdout), Some(stderr)) => Ok(CapturedOutput {
                code: status.code(),
                signal: exit_signal(&status),
                stdout: stdout.map_err(ProcessError::Wait)?,
                stderr: stderr.map_err(ProcessError::Wait)?,
                elapsed,
            }),
            _ => {
                warn!(
                    "Output pipes of {} still open at the deadline",
                    invocation.display()
                );
                Err(ProcessError::TimedOut(timeout))
            }
        }
    }
}

/// Bytes kept per stream; the rest is read and discarded.
const MAX_CAPTURE_BYTES: usize = 16 * 1024 * 1024;

type Drained = mpsc::Receiver<io::Result<String>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>, label: &'static str) -> Drained {
    let (tx, rx) = mpsc::channel();
    match pipe {
        Some(pipe) => {
            thread::spawn(move || {
                let _ = tx.send(read_capped(pipe, MAX_CAPTURE_BYTES, label));
            });
        }
        None => {
            let _ = tx.send(Ok(String::new()));
        }
    }
    rx
}

fn read_capped<R: Read>(mut reader: R, max_bytes: usize, label: &str) -> io::Result<String> {
    let mut bytes = Vec::with_capacity(max_bytes.min(8192));
    let mut total_bytes = 0usize;
    let mut chunk = [0_u8; 8192];
    loop {
        let read_len = reader.read(&mut chunk)?;
        if read_len == 0 {
            break;
        }
        total_bytes = total_bytes.saturating_add(read_len);
        if bytes.len() < max_bytes {
            let copy_len = read_len.min(max_bytes - bytes.len());
            bytes.extend_from_slice(&chunk[..copy_len]);
        }
    }
    if total_bytes > max_bytes {
        warn!("Discarded {} bytes of {label} beyond {max_bytes}", total_bytes - max_bytes);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `None` if the stream is still open at the deadline.
fn receive(rx: &Drained, deadline: Instant) -> Option<io::Result<String>> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(result) => Some(result),
        Err(mpsc::RecvTimeoutError::Timeout) => None,
        Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(io::Error::new(
            io::ErrorKind::Other,
            "output reader panicked",
        ))),
    }
}

fn wait_until(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
) -> Result<ExitStatus, ProcessError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                terminate(child);
                return Err(ProcessError::TimedOut(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                terminate(child);
                return Err(ProcessError::Wait(err));
            }
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Kill whatever is left of the process group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => (),
        Err(err) => warn!("Failed to kill process group {pid}: {err}"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

/// Kill the child together with everything it started, then reap it.
fn terminate(child: &mut Child) {
    kill_group(child.id());
    if let Err(err) = child.kill() {
        debug!("Kill of process {} failed: {err}", child.id());
    }
    if let Err(err) = child.wait() {
        warn!("Failed to reap process {}: {err}", child.id());
    }
}
