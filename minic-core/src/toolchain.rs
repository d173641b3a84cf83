//! Build and run generated C through an external toolchain.
//!
//! Subprocesses go through [`ProcessRunner`]. [`SystemRunner`] is the real
//! implementation: it bounds every child with a timeout and a
//! [`CancelToken`], and kills the child when either fires. Compile and run
//! failures are reported in an [`ExecutionReport`] instead of being
//! returned as errors.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Shared flag that asks a running subprocess to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Send the child's stdout to this file instead of capturing it.
    pub stdout_file: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ProcessSpec {
            program: program.into(),
            args: Vec::new(),
            stdout_file: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }
}

/// Exit code of a finished child; `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub Option<i32>);

impl ExitCode {
    pub fn success(self) -> bool {
        self.0 == Some(0)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("a signal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ExitCode,
    /// Captured stdout; empty when it was redirected to a file.
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("'{program}' was not found")]
    NotFound { program: PathBuf },
    #[error("failed to start '{program}': {reason}")]
    Spawn {
        program: PathBuf,
        reason: std::io::Error,
    },
    #[error("failed to wait for '{program}': {reason}")]
    Wait {
        program: PathBuf,
        reason: std::io::Error,
    },
    #[error("cannot redirect output to {path}: {reason}")]
    Redirect {
        path: PathBuf,
        reason: std::io::Error,
    },
    #[error("'{program}' did not finish within {timeout:?}")]
    TimedOut { program: PathBuf, timeout: Duration },
    #[error("'{program}' was cancelled")]
    Cancelled { program: PathBuf },
}

/// Runs one subprocess to completion.
pub trait ProcessRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError>;
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Option<Duration>,
    cancel: CancelToken,
    poll_interval: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        SystemRunner {
            timeout: None,
            cancel: CancelToken::new(),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn wait_bounded(&self, child: &mut Child, program: &Path) -> Result<ExitCode, ProcessError> {
        let started = Instant::now();
        loop {
            let polled = child.try_wait().map_err(|reason| ProcessError::Wait {
                program: program.to_path_buf(),
                reason,
            })?;
            if let Some(status) = polled {
                return Ok(ExitCode(status.code()));
            }
            if self.cancel.is_cancelled() {
                stop(child);
                return Err(ProcessError::Cancelled {
                    program: program.to_path_buf(),
                });
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    stop(child);
                    return Err(ProcessError::TimedOut {
                        program: program.to_path_buf(),
                        timeout,
                    });
                }
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
        let resolved = which::which(&spec.program).map_err(|_| ProcessError::NotFound {
            program: spec.program.clone(),
        })?;

        let mut command = Command::new(&resolved);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped());
        match &spec.stdout_file {
            Some(path) => {
                let file = File::create(path).map_err(|reason| ProcessError::Redirect {
                    path: path.clone(),
                    reason,
                })?;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }

        debug!(program = %resolved.display(), args = ?spec.args, "spawning");
        let mut child = command.spawn().map_err(|reason| ProcessError::Spawn {
            program: spec.program.clone(),
            reason,
        })?;

        // Pipes are drained on their own threads so a chatty child cannot
        // block on a full pipe while we poll for its exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait_bounded(&mut child, &spec.program)?;
        debug!(program = %resolved.display(), %status, "finished");

        Ok(ProcessOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

fn stop(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!(error = %err, "failed to kill child process");
    }
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).into_owned()
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// External C compiler invoked as `<compiler> <source> -o <executable> <args>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compiler: PathBuf,
    pub extra_args: Vec<String>,
}

impl Toolchain {
    pub fn new(compiler: impl Into<PathBuf>) -> Self {
        Toolchain {
            compiler: compiler.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn compile_spec(&self, source: &Path, executable: &Path) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.compiler)
            .arg(source)
            .arg("-o")
            .arg(executable);
        for arg in &self.extra_args {
            spec = spec.arg(arg);
        }
        spec
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain::new("gcc")
    }
}

/// Fixed locations of the files the orchestrator reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub source: PathBuf,
    pub executable: PathBuf,
    pub results: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        ArtifactPaths {
            source: PathBuf::from("output.c"),
            executable: PathBuf::from("program"),
            results: PathBuf::from("result.txt"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("compilation failed with {status}\n{stderr}")]
    CompileFailed { status: ExitCode, stderr: String },
    #[error("compiler could not be run: {0}")]
    Process(ProcessError),
}

// Not `#[from]`: the wrapped error is rendered inline, not chained.
impl From<ProcessError> for ToolchainError {
    fn from(err: ProcessError) -> Self {
        ToolchainError::Process(err)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("program exited with {status}")]
    NonZeroExit { status: ExitCode, output: String },
    #[error("program could not be run: {0}")]
    Process(ProcessError),
    #[error("cannot read {path}: {reason}")]
    UnreadableResults {
        path: PathBuf,
        reason: std::io::Error,
    },
}

impl From<ProcessError> for RuntimeError {
    fn from(err: ProcessError) -> Self {
        RuntimeError::Process(err)
    }
}

/// Outcome of [`build_and_run`]. None of these stop the caller.
#[derive(Debug)]
pub enum ExecutionReport {
    CompileFailed(ToolchainError),
    RunFailed(RuntimeError),
    Succeeded { output: String },
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionReport::Succeeded { .. })
    }
}

/// Compile `paths.source`, run the executable with stdout captured into
/// `paths.results`, and return what the program printed.
pub fn build_and_run(
    toolchain: &Toolchain,
    paths: &ArtifactPaths,
    runner: &dyn ProcessRunner,
) -> ExecutionReport {
    if let Err(err) = compile(toolchain, paths, runner) {
        warn!(error = %err, "build failed");
        return ExecutionReport::CompileFailed(err);
    }
    match run(paths, runner) {
        Ok(output) => ExecutionReport::Succeeded { output },
        Err(err) => {
            warn!(error = %err, "run failed");
            ExecutionReport::RunFailed(err)
        }
    }
}

fn compile(
    toolchain: &Toolchain,
    paths: &ArtifactPaths,
    runner: &dyn ProcessRunner,
) -> Result<(), ToolchainError> {
    let spec = toolchain.compile_spec(&paths.source, &paths.executable);
    info!(compiler = %toolchain.compiler.display(), source = %paths.source.display(), "compiling");
    let output = runner.run(&spec)?;
    if !output.status.success() {
        return Err(ToolchainError::CompileFailed {
            status: output.status,
            stderr: output.stderr,
        });
    }
    Ok(())
}

fn run(paths: &ArtifactPaths, runner: &dyn ProcessRunner) -> Result<String, RuntimeError> {
    // A bare relative name would otherwise be looked up on PATH.
    let executable = std::path::absolute(&paths.executable).map_err(|reason| {
        ProcessError::Spawn {
            program: paths.executable.clone(),
            reason,
        }
    })?;
    let spec = ProcessSpec::new(executable).stdout_to(&paths.results);
    info!(executable = %paths.executable.display(), results = %paths.results.display(), "running");
    let output = runner.run(&spec)?;

    let results = fs::read_to_string(&paths.results);
    if !output.status.success() {
        return Err(RuntimeError::NonZeroExit {
            status: output.status,
            output: results.unwrap_or_default(),
        });
    }
    results.map_err(|reason| RuntimeError::UnreadableResults {
        path: paths.results.clone(),
        reason,
    })
}
