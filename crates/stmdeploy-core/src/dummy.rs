//! Recording command runner for testing
//!
//! [`RecordingRunner`] never spawns anything. It remembers every invocation
//! it was asked to run and answers from a list of scripted responses, so the
//! builder, programmer and deployer can be exercised without any tools
//! installed and their argument vectors asserted exactly.

use std::sync::Mutex;
use std::time::Duration;

use crate::process::{CommandRunner, Invocation, RunError, ToolOutput};

/// Scripted outcome of an invocation
#[derive(Debug, Clone)]
pub enum Response {
    /// The process ran and produced this output
    Exit(ToolOutput),
    /// The program does not exist
    NotFound,
    /// The program hung past its budget
    Timeout,
}

/// Runner that records invocations instead of executing them
///
/// Responses are matched against the program path: the first rule whose key
/// is a substring of the program wins. Unmatched invocations succeed with
/// empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    rules: Vec<(String, Response)>,
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    /// Runner where every invocation succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations whose program contains `program` with `response`
    pub fn respond(mut self, program: &str, response: Response) -> Self {
        self.rules.push((program.to_string(), response));
        self
    }

    /// Shorthand for a successful run printing `stdout`
    pub fn succeed(self, program: &str, stdout: &str) -> Self {
        self.respond(program, Response::Exit(ToolOutput::success(stdout)))
    }

    /// Shorthand for a run exiting with `code` and printing `stderr`
    pub fn fail(self, program: &str, code: i32, stderr: &str) -> Self {
        self.respond(program, Response::Exit(ToolOutput::failure(code, stderr)))
    }

    /// All invocations seen so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of invocations seen so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Forget recorded invocations
    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, RunError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        let program = invocation.program_name();
        let response = self
            .rules
            .iter()
            .find(|(key, _)| program.contains(key.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| Response::Exit(ToolOutput::success("")));

        match response {
            Response::Exit(output) => Ok(output),
            Response::NotFound => Err(RunError::NotFound(program)),
            Response::Timeout => Err(RunError::Timeout {
                program,
                after: invocation.timeout.unwrap_or(Duration::ZERO),
            }),
        }
    }
}
