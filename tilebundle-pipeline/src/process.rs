//! `ToolRunner` backed by real subprocesses.

use std::io::{self, Read};
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;
use tilebundle_core::{ToolError, ToolInvocation, ToolOutput, ToolRunner};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

type StreamReader = JoinHandle<io::Result<Vec<u8>>>;

/// Runs tools as child processes with captured output.
///
/// Without a timeout a hung tool blocks the caller indefinitely. With one,
/// the child is killed once the limit passes and the run reports
/// [`ToolError::TimedOut`]. The limit also covers collecting output: a tool
/// that exits but leaves a background process holding its stdout or stderr
/// open times out too, and the detached reader threads finish whenever that
/// process closes the pipes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessToolRunner {
    timeout: Option<Duration>,
}

impl ProcessToolRunner {
    /// A runner that waits for tools indefinitely.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill tools that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured limit, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl ToolRunner for ProcessToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let mut command = Command::new(invocation.program());
        command
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match self.timeout {
            None => {
                let output = command.output().map_err(|source| ToolError::Spawn {
                    program: invocation.program().to_owned(),
                    source,
                })?;
                Ok(into_tool_output(&output))
            }
            Some(timeout) => run_with_deadline(&mut command, invocation.program(), timeout),
        }
    }
}

fn into_tool_output(output: &Output) -> ToolOutput {
    ToolOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn run_with_deadline(
    command: &mut Command,
    program: &str,
    timeout: Duration,
) -> Result<ToolOutput, ToolError> {
    let mut child = command.spawn().map_err(|source| ToolError::Spawn {
        program: program.to_owned(),
        source,
    })?;
    // Pipes are drained concurrently so a chatty tool cannot fill them and
    // stall before the deadline.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let Some(deadline) = Instant::now().checked_add(timeout) else {
        let status = child.wait().map_err(|source| wait_error(program, source))?;
        return Ok(ToolOutput {
            status: status.code(),
            stdout: collect(stdout, program)?,
            stderr: collect(stderr, program)?,
        });
    };

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|source| wait_error(program, source))?
        {
            if !readers_finish_by([stdout.as_ref(), stderr.as_ref()], deadline) {
                debug!("{program} exited but its output streams are still open");
                return Err(timed_out(program, timeout));
            }
            return Ok(ToolOutput {
                status: status.code(),
                stdout: collect(stdout, program)?,
                stderr: collect(stderr, program)?,
            });
        }
        if Instant::now() >= deadline {
            terminate(&mut child, program);
            return Err(timed_out(program, timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn readers_finish_by(readers: [Option<&StreamReader>; 2], deadline: Instant) -> bool {
    loop {
        if readers.iter().flatten().all(|reader| reader.is_finished()) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn timed_out(program: &str, timeout: Duration) -> ToolError {
    ToolError::TimedOut {
        program: program.to_owned(),
        timeout,
    }
}

fn terminate(child: &mut Child, program: &str) {
    if let Err(err) = child.kill() {
        debug!("failed to kill {program}: {err}");
    }
    if let Err(err) = child.wait() {
        debug!("failed to reap {program}: {err}");
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> StreamReader {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn collect(reader: Option<StreamReader>, program: &str) -> Result<String, ToolError> {
    let Some(handle) = reader else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| wait_error(program, io::Error::other("output reader panicked")))?
        .map_err(|source| wait_error(program, source))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn wait_error(program: &str, source: io::Error) -> ToolError {
    ToolError::Wait {
        program: program.to_owned(),
        source,
    }
}
