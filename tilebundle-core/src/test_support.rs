//! Test-only `ToolRunner` that replays scripted results per program.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crate::{ToolError, ToolInvocation, ToolOutput, ToolRunner};

#[derive(Debug, Clone)]
enum ScriptedResponse {
    Output(ToolOutput),
    SpawnFailure,
    Timeout(Duration),
}

/// Deterministic `ToolRunner` returning canned results keyed by program name.
///
/// Programs without a script succeed with empty output. Every invocation is
/// recorded, successful or not, so tests can assert which stages ran and in
/// what order.
#[derive(Debug, Default)]
pub struct ScriptedToolRunner {
    responses: HashMap<String, ScriptedResponse>,
    invocations: RefCell<Vec<ToolInvocation>>,
}

impl ScriptedToolRunner {
    /// A runner where every program succeeds silently.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `output` whenever `program` runs.
    #[must_use]
    pub fn with_output(mut self, program: impl Into<String>, output: ToolOutput) -> Self {
        self.responses
            .insert(program.into(), ScriptedResponse::Output(output));
        self
    }

    /// Make `program` exit with `status`, printing `stderr`.
    #[must_use]
    pub fn with_exit(self, program: impl Into<String>, status: i32, stderr: &str) -> Self {
        self.with_output(program, ToolOutput::exited(status, "", stderr))
    }

    /// Make `program` fail to start.
    #[must_use]
    pub fn with_spawn_failure(mut self, program: impl Into<String>) -> Self {
        self.responses
            .insert(program.into(), ScriptedResponse::SpawnFailure);
        self
    }

    /// Make `program` exceed `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, program: impl Into<String>, timeout: Duration) -> Self {
        self.responses
            .insert(program.into(), ScriptedResponse::Timeout(timeout));
        self
    }

    /// Every invocation seen so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.borrow().clone()
    }

    /// Program names of every invocation seen so far, in order.
    #[must_use]
    pub fn programs(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|invocation| invocation.program().to_owned())
            .collect()
    }
}

impl ToolRunner for ScriptedToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.invocations.borrow_mut().push(invocation.clone());
        let program = invocation.program().to_owned();
        match self.responses.get(invocation.program()) {
            None => Ok(ToolOutput::succeeded("")),
            Some(ScriptedResponse::Output(output)) => Ok(output.clone()),
            Some(ScriptedResponse::SpawnFailure) => Err(ToolError::Spawn {
                program,
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            Some(ScriptedResponse::Timeout(timeout)) => Err(ToolError::TimedOut {
                program,
                timeout: *timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn replays_scripts_and_records_order() {
        let runner = ScriptedToolRunner::new()
            .with_output("ogrinfo", ToolOutput::succeeded("{}"))
            .with_exit("tippecanoe", 1, "bad geometry");

        let probe = runner
            .run(&ToolInvocation::new("ogrinfo"))
            .expect("scripted output");
        assert_eq!(probe.stdout, "{}");
        let tiles = runner
            .run(&ToolInvocation::new("tippecanoe"))
            .expect("scripted exit");
        assert!(!tiles.success());
        assert_eq!(tiles.stderr, "bad geometry");
        let unscripted = runner
            .run(&ToolInvocation::new("pmtiles"))
            .expect("default output");
        assert!(unscripted.success());

        assert_eq!(runner.programs(), vec!["ogrinfo", "tippecanoe", "pmtiles"]);
    }

    #[rstest]
    fn scripted_failures_surface_as_errors() {
        let runner = ScriptedToolRunner::new()
            .with_spawn_failure("ogr2ogr")
            .with_timeout("tippecanoe", Duration::from_secs(5));

        let spawn = runner.run(&ToolInvocation::new("ogr2ogr"));
        assert!(matches!(spawn, Err(ToolError::Spawn { .. })));
        let timeout = runner.run(&ToolInvocation::new("tippecanoe"));
        assert!(matches!(timeout, Err(ToolError::TimedOut { .. })));
        assert_eq!(runner.invocations().len(), 2);
    }
}
