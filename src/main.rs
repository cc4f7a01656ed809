use argh::FromArgs;
use myshell::{BufReadSource, Interpreter};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Variable holding the log filter, in `tracing_subscriber::EnvFilter` syntax.
const LOG_ENV: &str = "MYSHELL_LOG";

#[derive(FromArgs)]
/// A minimal interactive shell. Type `myhelp` at the prompt for the builtin commands.
struct Args {}

fn main() -> ExitCode {
    let _args: Args = argh::from_env();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let mut shell = Interpreter::default();
    let result = if io::stdin().is_terminal() {
        shell.repl()
    } else {
        shell.repl_with(&mut BufReadSource::new(io::stdin().lock(), io::stdout()))
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "shell stopped");
            eprintln!("myshell: {e}");
            ExitCode::FAILURE
        }
    }
}
