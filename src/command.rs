use crate::env::Environment;
use anyhow::Result;
use std::io::{self, Write};
use std::process::Stdio;

/// Result of dispatching one command line.
///
/// The read-eval loop keeps prompting on [`Continuation::Continue`] and stops on
/// [`Continuation::Terminate`]. Every command except `myexit` continues, including
/// commands that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    Terminate,
}

/// A writable stream that can also hand a [`Stdio`] to child processes.
///
/// The standard streams give children the inherited descriptor. Memory-backed
/// streams (see [`crate::MemWriter`]) silence children instead, since their
/// bytes cannot be shared with another process.
pub trait OutputStream: Write {
    /// Produce the handle a spawned program should write to.
    fn stdio(&self) -> Stdio;
}

impl OutputStream for io::Stdout {
    fn stdio(&self) -> Stdio {
        Stdio::inherit()
    }
}

impl OutputStream for io::Stderr {
    fn stdio(&self) -> Stdio {
        Stdio::inherit()
    }
}

impl OutputStream for Vec<u8> {
    fn stdio(&self) -> Stdio {
        Stdio::null()
    }
}

/// Output and diagnostic streams a command writes to while it runs.
pub struct Streams<'a> {
    pub stdout: &'a mut dyn OutputStream,
    pub stderr: &'a mut dyn OutputStream,
}

impl<'a> Streams<'a> {
    pub fn new(stdout: &'a mut dyn OutputStream, stderr: &'a mut dyn OutputStream) -> Self {
        Self { stdout, stderr }
    }
}

/// Object-safe trait for any command the shell can run.
///
/// Implemented by builtins through a blanket impl and by the external program
/// launcher.
pub trait ExecutableCommand {
    /// Runs the command to completion.
    ///
    /// An `Err` is a failure the command could not report itself; the
    /// interpreter prints it and continues.
    fn execute(self: Box<Self>, io: &mut Streams<'_>, env: &mut Environment)
    -> Result<Continuation>;
}

/// Named entry of the builtin registry.
///
/// `create` receives the arguments that follow the command name and always
/// yields something runnable; argument errors become a command that reports them.
pub trait CommandFactory {
    /// Name the command is invoked by, matched exactly against argument 0.
    fn name(&self) -> &str;

    /// Build a command instance for the given arguments.
    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}
