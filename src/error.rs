use std::collections::TryReserveError;
use std::io;

/// Failures that end the read-eval loop.
///
/// Everything else a command can run into is reported where it happens and
/// never reaches this type.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Growing the argument vector failed.
    #[error("allocation error: {0}")]
    Allocation(#[from] TryReserveError),

    /// Reading the next input line failed for a reason other than end of input.
    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),
}
