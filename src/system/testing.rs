// src/system/testing.rs

use crate::core::command::Command;
use crate::system::executor::{ExecutionError, ProcessRunner, RawOutput};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Records every command instead of spawning it.
///
/// Clones share the same log, so a test keeps one handle and gives the other to
/// the environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingRunner {
    calls: Rc<RefCell<Vec<Command>>>,
    stdout: String,
    status: i32,
    failing_token: Option<String>,
    touch_outputs: bool,
    writes: Rc<RefCell<VecDeque<String>>>,
}

impl RecordingRunner {
    pub(crate) fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub(crate) fn with_status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    /// Any command containing `token` exits with status 1.
    pub(crate) fn failing_on(mut self, token: &str) -> Self {
        self.failing_token = Some(token.to_string());
        self
    }

    /// Creates every absolute path argument whose parent exists, like a tool writing
    /// its outputs.
    pub(crate) fn touching_outputs(mut self) -> Self {
        self.touch_outputs = true;
        self
    }

    /// Each successful call with an absolute path argument writes the next of
    /// `contents` to that path, overwriting it.
    pub(crate) fn writing_outputs<I, S>(self, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writes
            .borrow_mut()
            .extend(contents.into_iter().map(Into::into));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Command> {
        self.calls.borrow().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &Command, _verbose: bool) -> Result<RawOutput, ExecutionError> {
        self.calls.borrow_mut().push(command.clone());

        let fails = self
            .failing_token
            .as_ref()
            .is_some_and(|token| command.tokens().contains(token));
        let status = if fails { 1 } else { self.status };

        let target = command.args().iter().map(Path::new).find(|path| {
            path.is_absolute() && path.parent().is_some_and(Path::is_dir)
        });
        if let Some(path) = target.filter(|_| status == 0) {
            if let Some(contents) = self.writes.borrow_mut().pop_front() {
                fs::write(path, contents)
                    .map_err(|e| ExecutionError::CommandFailed(command.to_string(), e))?;
            }
        }

        if self.touch_outputs && status == 0 {
            for token in command.args() {
                let path = Path::new(token);
                if path.is_absolute() && path.parent().is_some_and(Path::is_dir) && !path.exists() {
                    fs::write(path, b"").map_err(|e| {
                        ExecutionError::CommandFailed(command.to_string(), e)
                    })?;
                }
            }
        }

        Ok(RawOutput {
            status: Some(status),
            stdout: self.stdout.clone(),
            stderr: if status == 0 {
                String::new()
            } else {
                "Error: tool failed".to_string()
            },
        })
    }
}
