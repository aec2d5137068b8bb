//! Capability interface for invoking external command-line tools.
//!
//! Conversion and introspection binaries are shared, global resources. The
//! pipeline reaches them only through [`ToolRunner`], so tests can substitute
//! scripted results for each scenario.

use std::{fmt, io, time::Duration};

use thiserror::Error;

/// A program plus its argument list. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: String,
    args: Vec<String>,
}

impl ToolInvocation {
    /// Start an invocation of `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, excluding the program.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Program followed by its arguments.
    #[must_use]
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Standard output, decoded lossily as UTF-8.
    pub stdout: String,
    /// Standard error, decoded lossily as UTF-8.
    pub stderr: String,
}

impl ToolOutput {
    /// A zero-status result carrying `stdout`.
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A result with the given exit code and captured streams.
    pub fn exited(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Only a zero exit status counts as success.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Failures that prevent a tool from producing a [`ToolOutput`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Waiting on the process or collecting its output failed.
    #[error("failed to collect output from {program}: {source}")]
    Wait {
        /// Program being awaited.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The program ran past the configured limit and was killed.
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut {
        /// Program that was killed.
        program: String,
        /// Limit that was exceeded.
        timeout: Duration,
    },
}

/// Runs an external tool to completion and reports what it printed.
///
/// A non-zero exit is not an error at this level; callers inspect
/// [`ToolOutput::success`]. Errors are reserved for tools that never ran or
/// never finished.
///
/// # Examples
///
/// ```
/// use tilebundle_core::{ToolError, ToolInvocation, ToolOutput, ToolRunner};
///
/// struct Echo;
///
/// impl ToolRunner for Echo {
///     fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
///         Ok(ToolOutput::succeeded(invocation.arguments().join(" ")))
///     }
/// }
///
/// let output = Echo.run(&ToolInvocation::new("echo").arg("hello"))?;
/// assert!(output.success());
/// assert_eq!(output.stdout, "hello");
/// # Ok::<(), ToolError>(())
/// ```
pub trait ToolRunner {
    /// Run `invocation` and wait for it to exit.
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        (**self).run(invocation)
    }
}

impl<T: ToolRunner + ?Sized> ToolRunner for Box<T> {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        (**self).run(invocation)
    }
}
