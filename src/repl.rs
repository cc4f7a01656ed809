//! Input side of the read-eval loop.
//!
//! The loop itself lives on [`crate::Interpreter`]; this module defines where
//! lines come from and the loop's two states.

use crate::error::ShellError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};

/// Prompt printed before every line is read.
pub const PROMPT: &str = "> ";

/// State of the read-eval loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// What one attempt to read a line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, possibly still carrying its line terminator.
    Line(String),
    /// The user pressed Ctrl-C at the prompt; the partial line is dropped.
    Interrupted,
    /// No more input will arrive.
    Eof,
}

/// Source of input lines for the loop.
pub trait LineSource {
    /// Show `prompt` and block until a line, an interrupt or end of input.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(readline_failure(err)),
        }
    }
}

pub(crate) fn readline_failure(err: ReadlineError) -> ShellError {
    match err {
        ReadlineError::Io(e) => ShellError::Input(e),
        other => ShellError::Input(io::Error::other(other.to_string())),
    }
}

/// Reads lines from any buffered reader, writing the prompt to `prompt_out`.
///
/// Used when input is not a terminal and by tests.
pub struct BufReadSource<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> BufReadSource<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.prompt_out)
    }
}

impl<R: BufRead, W: Write> LineSource for BufReadSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError> {
        write!(self.prompt_out, "{prompt}").map_err(ShellError::Input)?;
        self.prompt_out.flush().map_err(ShellError::Input)?;

        // Bytes that are not UTF-8 become U+FFFD instead of failing the read.
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) => Ok(ReadOutcome::Line(String::from_utf8_lossy(&line).into_owned())),
            Err(e) => Err(ShellError::Input(e)),
        }
    }
}
