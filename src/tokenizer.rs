//! Splitting of input lines into argument vectors.
//!
//! Tokens are maximal runs of non-delimiter characters. There is no quoting,
//! escaping or expansion: `"a b"` is the two tokens `"a` and `b"`.

use crate::error::ShellError;

/// Characters that separate tokens: space, tab, carriage return, newline, bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

const INITIAL_CAPACITY: usize = 64;

/// Ordered tokens of one input line, borrowed from that line.
///
/// Argument 0, when present, names the command. An empty vector is a blank line.
pub type ArgVector<'a> = Vec<&'a str>;

/// Split `line` into its argument vector.
///
/// Capacity starts at 64 slots and doubles whenever it is exhausted. Failing to
/// grow is reported as [`ShellError::Allocation`] instead of aborting.
pub fn tokenize(line: &str) -> Result<ArgVector<'_>, ShellError> {
    let mut args = ArgVector::new();
    args.try_reserve_exact(INITIAL_CAPACITY)?;

    for token in line.split(DELIMITERS).filter(|t| !t.is_empty()) {
        if args.len() == args.capacity() {
            args.try_reserve_exact(args.capacity())?;
        }
        args.push(token);
    }

    Ok(args)
}
