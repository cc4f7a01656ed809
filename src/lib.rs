//! A small interactive shell.
//!
//! Each input line is split on whitespace into an argument vector. Argument 0
//! is looked up in a [`registry::BuiltinRegistry`]; builtins run in-process,
//! anything else is located on `PATH` and run as a child process that the shell
//! waits for before prompting again. There is no quoting, no pipelines and no
//! job control.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`],
//! [`env`], [`registry`] and [`tokenizer`] expose the pieces needed to build a
//! reduced or mock command table, or to drive the loop from something other
//! than a terminal.

mod builtin;
pub mod command;
pub mod env;
mod error;
mod external;
mod interpreter;
mod io_adapters;
pub mod registry;
mod repl;
pub mod tokenizer;

pub use error::ShellError;
pub use external::{ExternalCommand, find_command_path};
pub use interpreter::Interpreter;
pub use io_adapters::MemWriter;
pub use repl::{BufReadSource, LineSource, LoopState, PROMPT, ReadOutcome};
