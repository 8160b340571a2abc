use super::{RunLimits, RunResult, Runner};
use crate::core::error::{Error, Result};
use crate::util::shell_command;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

const INPUT_FILE: &str = "std_input";
const STDERR_FILE: &str = "std_err";

/// How often a running child is checked for an exceeded output cap.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs programs as shell commands in a working directory.
///
/// The sample input and the child's stderr go through two scratch files in a
/// private temporary directory. They are rewritten on every run and removed
/// when the runner is dropped. Stdout is read on a separate thread and capped
/// at [`RunLimits::capture_cap`].
pub struct ProcessRunner {
    workdir: PathBuf,
    scratch: tempfile::TempDir,
}

impl ProcessRunner {
    /// Create a runner whose commands execute in `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("sample-runner-")
            .tempdir()?;
        Ok(Self {
            workdir: workdir.into(),
            scratch,
        })
    }

    /// Scratch directory holding the staged input and captured stderr.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Write `input` to the scratch file, close it, and reopen it for reading.
    fn stage_input(&self, input: &str) -> Result<File> {
        let path = self.scratch.path().join(INPUT_FILE);
        {
            let mut file = File::create(&path)?;
            file.write_all(input.as_bytes())?;
            file.flush()?;
        }
        Ok(File::open(&path)?)
    }

    fn read_stderr(&self) -> Result<String> {
        let bytes = std::fs::read(self.scratch.path().join(STDERR_FILE))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Runner for ProcessRunner {
    fn run(&self, command: &str, input: &str, limits: &RunLimits) -> Result<RunResult> {
        let stdin = self.stage_input(input)?;
        let stderr = File::create(self.scratch.path().join(STDERR_FILE))?;

        let mut cmd = shell_command(command, &self.workdir);
        cmd.stdin(Stdio::from(stdin));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::from(stderr));

        // Own process group, so a kill reaches the shell and everything it started.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        tracing::debug!(command, time = ?limits.time, output = limits.output, "spawning program");

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::runner(format!("failed to execute {}: {}", command, e)))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = kill_and_reap(&mut child);
                return Err(Error::runner(format!("stdout of {} was not captured", command)));
            }
        };
        let capture = StdoutCapture::start(stdout, limits.capture_cap());

        let waited = supervise(&mut child, start + limits.time, &capture);
        let elapsed = start.elapsed();
        let captured = capture.finish();

        let (status, stop) =
            waited.map_err(|e| Error::runner(format!("failed to wait for {}: {}", command, e)))?;
        let (stdout, output_exceeded) = captured?;

        let exit_code = status.code().unwrap_or(-1);
        let mut result = RunResult::new(exit_code, status.success())
            .with_output(String::from_utf8_lossy(&stdout).into_owned(), self.read_stderr()?)
            .with_elapsed(elapsed);
        if stop == Some(Stop::Time) {
            result = result.with_timeout();
        }
        if output_exceeded {
            result = result.with_output_exceeded();
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "process"
    }

    fn last_stderr(&self) -> Option<String> {
        self.read_stderr().ok()
    }
}

/// Why a child was killed before it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Time,
    Output,
}

/// Wait for `child` until it exits, the deadline passes, or its stdout
/// overflows. Kills only happen while the child is still unreaped.
fn supervise(
    child: &mut Child,
    deadline: Instant,
    capture: &StdoutCapture,
) -> io::Result<(ExitStatus, Option<Stop>)> {
    loop {
        if capture.exceeded() {
            tracing::debug!(pid = child.id(), "output cap reached, killing process group");
            return kill_and_reap(child).map(|status| (status, Some(Stop::Output)));
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(pid = child.id(), "time limit reached, killing process group");
            return kill_and_reap(child).map(|status| (status, Some(Stop::Time)));
        }

        match child.wait_timeout(POLL_INTERVAL.min(deadline - now)) {
            Ok(Some(status)) => return Ok((status, None)),
            Ok(None) => {}
            Err(e) => {
                let _ = kill_and_reap(child);
                return Err(e);
            }
        }
    }
}

/// Reads a child's stdout on its own thread, keeping at most `cap` bytes.
struct StdoutCapture {
    exceeded: Arc<AtomicBool>,
    handle: JoinHandle<io::Result<Vec<u8>>>,
}

impl StdoutCapture {
    fn start(stdout: ChildStdout, cap: u64) -> Self {
        let exceeded = Arc::new(AtomicBool::new(false));
        let flag = exceeded.clone();

        let handle = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.take(cap.saturating_add(1)).read_to_end(&mut buf)?;
            if buf.len() as u64 > cap {
                // Only reachable when cap < buf.len(), so the cast is lossless
                buf.truncate(cap as usize);
                flag.store(true, Ordering::SeqCst);
            }
            Ok(buf)
        });

        Self { exceeded, handle }
    }

    fn exceeded(&self) -> bool {
        self.exceeded.load(Ordering::SeqCst)
    }

    /// Join the reader and return the captured bytes and whether the cap was hit.
    fn finish(self) -> Result<(Vec<u8>, bool)> {
        let bytes = self
            .handle
            .join()
            .map_err(|_| Error::runner("stdout reader thread panicked"))??;
        Ok((bytes, self.exceeded.load(Ordering::SeqCst)))
    }
}

/// Kill the child's process group, then reap the child.
fn kill_and_reap(child: &mut Child) -> io::Result<ExitStatus> {
    kill_process_group(child);
    child.wait()
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    // SAFETY: kill(2) with a negative pid signals the process group led by
    // the child, which has not been reaped yet.
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}
