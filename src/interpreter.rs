use crate::command::{Continuation, ExecutableCommand, OutputStream, Streams};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::registry::BuiltinRegistry;
use crate::repl::{LineSource, LoopState, PROMPT, ReadOutcome, readline_failure};
use crate::tokenizer::tokenize;
use rustyline::DefaultEditor;
use std::io;
use tracing::{debug, warn};

/// A minimal interactive shell that runs builtin and external commands.
///
/// The interpreter owns the [`Environment`], the [`BuiltinRegistry`] consulted
/// before anything is launched, and the streams commands write to.
///
/// Example
/// ```
/// use myshell::{Interpreter, command::Continuation};
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute(&[]), Continuation::Continue);
/// assert_eq!(sh.execute(&["myexit"]), Continuation::Terminate);
/// ```
pub struct Interpreter {
    env: Environment,
    registry: BuiltinRegistry,
    stdout: Box<dyn OutputStream>,
    stderr: Box<dyn OutputStream>,
}

impl Interpreter {
    /// Create an interpreter over the process's standard streams.
    pub fn new(registry: BuiltinRegistry) -> Self {
        Self::with_streams(registry, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Create an interpreter writing to the given streams.
    pub fn with_streams(
        registry: BuiltinRegistry,
        stdout: Box<dyn OutputStream>,
        stderr: Box<dyn OutputStream>,
    ) -> Self {
        let mut env = Environment::new();
        env.builtins = registry.names().into_iter().map(String::from).collect();
        Self {
            env,
            registry,
            stdout,
            stderr,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run one argument vector.
    ///
    /// An empty vector does nothing. Otherwise argument 0 is looked up in the
    /// registry; a hit runs in-process, a miss is launched as a program. Failures
    /// are reported on the error stream here and never propagate.
    pub fn execute(&mut self, args: &[&str]) -> Continuation {
        let Some((&name, rest)) = args.split_first() else {
            return Continuation::Continue;
        };

        let command: Box<dyn ExecutableCommand> = match self.registry.resolve(name) {
            Some(factory) => {
                debug!(name, "dispatching builtin");
                factory.create(rest)
            }
            None => {
                debug!(name, "launching external command");
                Box::new(ExternalCommand::new(name, rest))
            }
        };

        let mut io = Streams::new(&mut *self.stdout, &mut *self.stderr);
        let flow = match command.execute(&mut io, &mut self.env) {
            Ok(flow) => flow,
            Err(e) => {
                warn!(name, error = %format!("{e:#}"), "command failed");
                let _ = writeln!(io.stderr, "myshell: {e:#}");
                Continuation::Continue
            }
        };
        let _ = io.stdout.flush();
        flow
    }

    /// Tokenize `line` and run it.
    pub fn run_line(&mut self, line: &str) -> Result<Continuation, ShellError> {
        let args = tokenize(line)?;
        Ok(self.execute(&args))
    }

    /// Perform one read-eval step from the `Running` state.
    pub fn step(&mut self, source: &mut dyn LineSource) -> Result<LoopState, ShellError> {
        let state = match source.read_line(PROMPT)? {
            ReadOutcome::Eof => {
                debug!("end of input");
                LoopState::Stopped
            }
            ReadOutcome::Interrupted => LoopState::Running,
            ReadOutcome::Line(line) => match self.run_line(&line)? {
                Continuation::Continue => LoopState::Running,
                Continuation::Terminate => LoopState::Stopped,
            },
        };
        Ok(state)
    }

    /// Read and run lines from `source` until end of input or `myexit`.
    pub fn repl_with(&mut self, source: &mut dyn LineSource) -> Result<(), ShellError> {
        let mut state = LoopState::Running;
        while state == LoopState::Running {
            state = self.step(source)?;
        }
        Ok(())
    }

    /// Interactive loop on the terminal, with line editing and history.
    pub fn repl(&mut self) -> Result<(), ShellError> {
        let mut editor = DefaultEditor::new().map_err(readline_failure)?;
        self.repl_with(&mut editor)
    }
}

impl Default for Interpreter {
    /// An interpreter with the standard builtins on the standard streams.
    fn default() -> Self {
        Self::new(BuiltinRegistry::default())
    }
}
