// EN: src/system/executor.rs

use crate::core::{command::Command, output::Output, temp_files::TempFileError};
use std::fmt;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::process::{Command as StdCommand, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Executable '{0}' could not be found.")]
    ExecutableNotFound(String),
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
    #[error("Command '{command}' exited with {}.\n{}", .output.status_label(), .output.diagnostics())]
    NonZeroExit {
        command: String,
        output: Box<Output>,
    },
    #[error(transparent)]
    TempFile(#[from] TempFileError),
}

/// How a single execution behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Turn a non-zero exit status into [`ExecutionError::NonZeroExit`].
    pub strict: bool,
    /// Echo the tool's progress lines while it runs.
    pub verbose: bool,
}

impl ExecOptions {
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

/// What a process left behind: its exit code and captured text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a command to completion and captures what it printed.
///
/// The boundary between the object model and the operating system. The default
/// implementation is [`SystemRunner`]; tests swap in recording fakes.
pub trait ProcessRunner: fmt::Debug {
    fn run(&self, command: &Command, verbose: bool) -> Result<RawOutput, ExecutionError>;
}

/// Spawns the program directly (no shell) with the remaining tokens as arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &Command, verbose: bool) -> Result<RawOutput, ExecutionError> {
        let (program, args) = command
            .split_first()
            .ok_or(ExecutionError::EmptyCommand)?;
        let command_line = command.to_string();
        log::debug!("Executing: {}", command_line);
        log::trace!("Tokens: {:?}", command.tokens());

        let mut process = StdCommand::new(program);
        process
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let spawn_error = |e: std::io::Error| {
            if e.kind() == ErrorKind::NotFound {
                ExecutionError::ExecutableNotFound(program.clone())
            } else {
                ExecutionError::CommandFailed(command_line.clone(), e)
            }
        };

        if !verbose {
            let output = process.output().map_err(spawn_error)?;
            return Ok(RawOutput {
                status: output.status.code(),
                stdout: decode(&output.stdout),
                stderr: decode(&output.stderr),
            });
        }

        let mut child = process.spawn().map_err(spawn_error)?;

        // Drain stderr on its own thread so a chatty tool cannot block on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                pipe.read_to_end(&mut buffer).map(|_| buffer)
            })
        });

        let mut stdout = Vec::new();
        if let Some(pipe) = child.stdout.take() {
            if let Err(e) = stream_lines(BufReader::new(pipe), &mut stdout) {
                // Reap the child so it does not linger after the read failed.
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecutionError::CommandFailed(command_line.clone(), e));
            }
        }

        let status = child
            .wait()
            .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

        let stderr = match stderr_reader {
            Some(handle) => handle
                .join()
                .map_err(|_| {
                    ExecutionError::CommandFailed(
                        command_line.clone(),
                        std::io::Error::other("stderr reader thread panicked"),
                    )
                })?
                .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?,
            None => Vec::new(),
        };

        Ok(RawOutput {
            status: status.code(),
            stdout: decode(&stdout),
            stderr: decode(&stderr),
        })
    }
}

/// Captures `reader` line by line, echoing progress lines as they arrive.
fn stream_lines<R: BufRead>(mut reader: R, captured: &mut Vec<u8>) -> std::io::Result<()> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        report_progress(&String::from_utf8_lossy(&line));
        captured.extend_from_slice(&line);
    }
}

/// Bytes that are not UTF-8 (console code pages) become replacement characters.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Echoes a percentage line. Bare percentages overwrite each other on one line;
/// the final one (or one carrying text) ends the line.
fn report_progress(line: &str) {
    let line = line.trim();
    if !line.contains('%') {
        return;
    }
    let ending = progress_line_ending(line);
    let mut stdout = std::io::stdout().lock();
    // A closed terminal must not abort the tool run.
    let _ = write!(stdout, "{}{}", line, ending).and_then(|()| stdout.flush());
}

fn progress_line_ending(line: &str) -> &'static str {
    if line.contains("100") || line.chars().any(char::is_alphabetic) {
        "\n"
    } else {
        "\r"
    }
}

// MARK: --- UNIT TESTS ---
