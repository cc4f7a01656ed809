use crate::command::{Continuation, ExecutableCommand, Streams};
use crate::env::Environment;
use anyhow::{Context, Result, anyhow};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Command that is not a builtin: a program found on the search path.
///
/// Running it spawns a child process and blocks until the child has exited or
/// been killed by a signal. The child's status is logged but never changes the
/// outcome, which is always [`Continuation::Continue`].
pub struct ExternalCommand {
    name: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    /// `name` is argument 0 as typed; `args` are the arguments after it.
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|x| x.into()).collect(),
        }
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        env: &mut Environment,
    ) -> Result<Continuation> {
        let display_name = self.name.to_string_lossy();
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let program = find_command_path(search_paths, Path::new(&self.name))
            .ok_or_else(|| anyhow!("{display_name}: command not found"))?;

        // Anything buffered must land before the child starts writing.
        io.stdout.flush()?;
        io.stderr.flush()?;

        let mut cmd = Command::new(&*program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&self.name);
        }
        let mut child = cmd
            .args(&self.args)
            .envs(&env.vars)
            .current_dir(&env.current_dir)
            .stdin(Stdio::inherit())
            .stdout(io.stdout.stdio())
            .stderr(io.stderr.stdio())
            .spawn()
            .with_context(|| display_name.to_string())?;
        debug!(pid = child.id(), program = %program.display(), "spawned child");

        let exit_status = child
            .wait()
            .with_context(|| format!("{display_name}: waiting for child failed"))?;
        match exit_status.code() {
            Some(code) => debug!(code, "child exited"),
            None => debug!(code = terminated_by_signal(exit_status), "child killed by signal"),
        }
        Ok(Continuation::Continue)
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Locate the program to launch for argument 0.
///
/// A bare name is searched for in each directory of `search_paths` and the
/// first regular file that may be executed wins. Anything containing a separator is used as given
/// if it exists. `None` means the shell should report "command not found".
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::lock_current_dir;
    use std::fs;
    use std::fs::File;

    #[cfg(unix)]
    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn run(name: &str, args: &[&str], env: &mut Environment) -> (Continuation, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = Box::new(ExternalCommand::new(name, args))
            .execute(&mut Streams::new(&mut out, &mut err), env);
        let flow = match result {
            Ok(flow) => flow,
            Err(e) => {
                err.extend_from_slice(format!("{e:#}").as_bytes());
                Continuation::Continue
            }
        };
        (flow, String::from_utf8(err).unwrap())
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_some(), "Expected to find /bin/sh via absolute path");
        let found = res.unwrap();
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_in_path() {
        let path = Path::new("sh");
        let res = find_command_path(osstr("/nonexistent_dir:/bin"), path);
        let found = res.expect("Expected to find 'sh' in /bin via PATH search");
        assert!(found.as_ref().ends_with("sh"));
        assert!(found.as_ref().starts_with("/bin"), "Expected path in /bin, got {:?}", found);
    }

    #[test]
    #[cfg(unix)]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn directories_on_path_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("sh")).unwrap();
        let search = format!("{}:/bin", temp.path().display());
        let found = find_command_path(osstr(&search), Path::new("sh")).unwrap();
        assert!(found.as_ref().starts_with("/bin"));
    }

    #[test]
    #[cfg(unix)]
    fn non_executable_files_on_path_are_skipped() {
        use std::os::unix::fs::PermissionsExt;
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for (dir, mode) in [(&first, 0o644), (&second, 0o755)] {
            let tool = dir.path().join("tool");
            fs::write(&tool, "#!/bin/sh\n").unwrap();
            fs::set_permissions(&tool, fs::Permissions::from_mode(mode)).unwrap();
        }
        let search = std::env::join_paths([first.path(), second.path()]).unwrap();

        let found = find_command_path(&search, Path::new("tool")).unwrap();

        assert_eq!(found.as_ref(), second.path().join("tool"));
    }

    #[test]
    #[cfg(unix)]
    fn multiple_components_relative_existing() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("bin")).expect("create temp bin dir");
        File::create(temp.path().join("bin").join("sh")).expect("touch bin/sh");

        std::env::set_current_dir(temp.path()).expect("set cwd");
        let res = find_command_path(osstr("/does/not/matter"), Path::new("bin/sh"));
        std::env::set_current_dir(&cwd_before).ok();

        let found = res.expect("Expected to find relative 'bin/sh' in current dir");
        assert!(found.as_ref().ends_with("bin/sh"));
    }

    #[test]
    #[cfg(unix)]
    fn current_dir_with_dot_prefix() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let temp = tempfile::tempdir().unwrap();
        File::create(temp.path().join("foo")).expect("touch foo");

        std::env::set_current_dir(temp.path()).expect("set cwd");
        let res = find_command_path(osstr("/bin"), Path::new("./foo"));
        std::env::set_current_dir(&cwd_before).ok();

        let found = res.expect("Expected to find './foo' in current dir");
        assert_eq!(found.as_ref(), Path::new("./foo"));
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(OsStr::new("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    #[cfg(unix)]
    fn runs_program_and_continues() {
        let _lock = lock_current_dir();
        let mut env = Environment::new();
        let (flow, err) = run("true", &[], &mut env);
        assert_eq!(flow, Continuation::Continue);
        assert!(err.is_empty(), "unexpected stderr: {err}");
    }

    #[test]
    #[cfg(unix)]
    fn failing_program_still_continues() {
        let _lock = lock_current_dir();
        let mut env = Environment::new();
        let (flow, err) = run("false", &[], &mut env);
        assert_eq!(flow, Continuation::Continue);
        assert!(err.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn program_killed_by_signal_continues() {
        let _lock = lock_current_dir();
        let mut env = Environment::new();
        let (flow, _) = run("sh", &["-c", "kill -9 $$"], &mut env);
        assert_eq!(flow, Continuation::Continue);
    }

    #[test]
    #[cfg(unix)]
    fn signal_status_maps_above_128() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(terminated_by_signal(ExitStatus::from_raw(9)), 137);
    }

    #[test]
    fn missing_program_is_reported() {
        let mut env = Environment::new();
        let (flow, err) = run("definitely_not_a_program_4242", &[], &mut env);
        assert_eq!(flow, Continuation::Continue);
        assert_eq!(err, "definitely_not_a_program_4242: command not found");
    }

    #[test]
    #[cfg(unix)]
    fn child_sees_raw_variable_bytes() {
        use std::os::unix::ffi::OsStrExt;
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        env.current_dir = temp.path().to_path_buf();
        env.vars
            .insert("MYSHELL_RAW".into(), OsStr::from_bytes(b"a\xffb").to_os_string());

        run("sh", &["-c", "printf %s \"$MYSHELL_RAW\" > raw"], &mut env);

        assert_eq!(fs::read(temp.path().join("raw")).unwrap(), b"a\xffb");
    }

    #[test]
    #[cfg(unix)]
    fn runs_in_tracked_directory() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        env.current_dir = temp.path().to_path_buf();

        run("sh", &["-c", "echo here > marker"], &mut env);

        assert_eq!(fs::read_to_string(temp.path().join("marker")).unwrap(), "here\n");
    }
}
