use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// User-level view of the process state the shell works with.
///
/// The environment contains:
/// - `vars`: the variables captured at startup; read for the `PATH` lookup and
///   handed to every spawned program. The shell never changes them.
/// - `current_dir`: the working directory, kept in step with the process's own
///   by `mycd`. Relative paths given to builtins resolve against it.
/// - `builtins`: names of the in-process commands, in registry order.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Environment variables (e.g., PATH, HOME), byte for byte as inherited.
    pub vars: HashMap<OsString, OsString>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// Commands answered by the builtin registry.
    pub builtins: Vec<String>,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Variables are copied from `std::env::vars_os()` without conversion, so
    /// values that are not UTF-8 reach child processes unchanged.
    pub fn new() -> Self {
        let vars = stdenv::vars_os().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            builtins: Vec::new(),
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Interpret `path` relative to `current_dir` unless it is absolute.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes tests that read or change the process-wide working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
