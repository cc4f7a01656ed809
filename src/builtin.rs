use crate::command::{CommandFactory, Continuation, ExecutableCommand, Streams};
use crate::env::Environment;
use crate::registry::Factory;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io;
use tracing::{debug, warn};

/// Separator between entries printed by `myls`.
const LS_SEPARATOR: &str = "     ";

/// Terminal reset sequence (`ESC c`) written by `myclear`.
const CLEAR_SEQUENCE: &str = "\x1bc";

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "mycd".
    fn name() -> &'static str;

    /// Parse the arguments following the command name.
    ///
    /// Builtins take no options, so every word is an operand, even one that
    /// starts with `-`. Only a leading `--help` asks for usage.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        match args {
            [] | ["--help", ..] => Self::from_args(&[Self::name()], args),
            _ => {
                let mut operands = Vec::with_capacity(args.len() + 1);
                operands.push("--");
                operands.extend_from_slice(args);
                Self::from_args(&[Self::name()], &operands)
            }
        }
    }

    /// Executes the command using provided streams and environment.
    ///
    /// An `Err` is printed to the error stream by the caller; the shell keeps running.
    fn execute(self, io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        env: &mut Environment,
    ) -> Result<Continuation> {
        match <T as BuiltinCommand>::execute(*self, io, env) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                warn!(command = T::name(), error = %format!("{e:#}"), "builtin failed");
                writeln!(io.stderr, "{e:#}")?;
                Ok(Continuation::Continue)
            }
        }
    }
}

/// Stands in for a builtin whose arguments did not parse, or that was asked for `--help`.
struct InvalidArgs {
    name: &'static str,
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        _env: &mut Environment,
    ) -> Result<Continuation> {
        let output = self.output.trim_end();
        if self.is_error {
            debug!(command = self.name, "usage error");
            writeln!(io.stderr, "{}: {}", self.name, output)?;
        } else {
            writeln!(io.stdout, "{output}")?;
        }
        Ok(Continuation::Continue)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &str {
        T::name()
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        match T::parse(args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                name: T::name(),
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "mycd"
    }

    fn execute(self, _io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        let Some(target) = self.target else {
            bail!("mycd: expected argument");
        };

        let new_dir = env.resolve_path(&target);
        let canonical =
            fs::canonicalize(&new_dir).with_context(|| format!("mycd: {target}"))?;

        std::env::set_current_dir(&canonical)
            .with_context(|| format!("mycd: {}", canonical.display()))?;
        debug!(dir = %canonical.display(), "changed directory");
        env.current_dir = canonical;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Print a usage banner and the names of the builtin commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "myhelp"
    }

    fn execute(self, io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        writeln!(io.stdout, "myshell: a minimal interactive shell")?;
        writeln!(io.stdout, "Type a program name and its arguments, then press enter.")?;
        writeln!(io.stdout, "These commands are built in:")?;
        for name in &env.builtins {
            writeln!(io.stdout, "  {name}")?;
        }
        writeln!(io.stdout, "Everything else is looked up on PATH; see man for those programs.")?;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; any arguments are accepted.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "myexit"
    }

    // Never rejects its arguments, `--help` included.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Self {
            _args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }

    fn execute(self, _io: &mut Streams<'_>, _env: &mut Environment) -> Result<Continuation> {
        Ok(Continuation::Terminate)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Print the absolute path of the current working directory.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "mypwd"
    }

    fn execute(self, io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        writeln!(io.stdout, "{}", env.current_dir.display())?;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// List the entries of a directory, skipping names that start with a dot.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub dir: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "myls"
    }

    fn execute(self, io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        let shown = self.dir.as_deref().unwrap_or(".");
        let dir = env.resolve_path(shown);
        let entries =
            fs::read_dir(&dir).with_context(|| format!("myls: could not open {shown}"))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("myls: could not read {shown}"))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();

        writeln!(io.stdout, "{}", names.join(LS_SEPARATOR))?;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Copy the bytes of one file into another. Permissions and timestamps are not copied.
pub struct Cp {
    #[argh(positional)]
    /// file to read from; must exist.
    pub source: String,

    #[argh(positional)]
    /// file to write; created readable and writable by the owner only when absent.
    pub destination: String,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "mycp"
    }

    fn execute(self, _io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        let source_path = env.resolve_path(&self.source);
        let destination_path = env.resolve_path(&self.destination);

        // The source is opened first so a bad source never creates the destination.
        let mut source = File::open(&source_path)
            .with_context(|| format!("mycp: cannot open {}", self.source))?;
        if source.metadata()?.is_dir() {
            bail!("mycp: {} is a directory", self.source);
        }
        if let (Ok(a), Ok(b)) = (
            fs::canonicalize(&source_path),
            fs::canonicalize(&destination_path),
        ) {
            if a == b {
                bail!("mycp: {} and {} are the same file", self.source, self.destination);
            }
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut destination = options
            .open(&destination_path)
            .with_context(|| format!("mycp: cannot create {}", self.destination))?;

        let copied = io::copy(&mut source, &mut destination)
            .with_context(|| format!("mycp: copying to {} failed", self.destination))?;
        debug!(bytes = copied, "copied file");
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Rename a file or directory.
pub struct Mv {
    #[argh(positional)]
    /// existing name.
    pub source: String,

    #[argh(positional)]
    /// new name.
    pub destination: String,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mymv"
    }

    fn execute(self, _io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        fs::rename(
            env.resolve_path(&self.source),
            env.resolve_path(&self.destination),
        )
        .with_context(|| format!("mymv: cannot move {} to {}", self.source, self.destination))?;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Clear the terminal screen.
pub struct Clear {}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "myclear"
    }

    fn execute(self, io: &mut Streams<'_>, _env: &mut Environment) -> Result<Continuation> {
        write!(io.stdout, "{CLEAR_SEQUENCE}")?;
        io.stdout.flush()?;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Create each named file if it does not exist. Existing files are left as they are.
pub struct Touch {
    #[argh(positional)]
    /// files to create.
    pub paths: Vec<String>,
}

impl BuiltinCommand for Touch {
    fn name() -> &'static str {
        "mytouch"
    }

    fn execute(self, io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        if self.paths.is_empty() {
            bail!("mytouch: expected at least one file name");
        }

        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o777);
        }

        for path in &self.paths {
            if let Err(e) = options.open(env.resolve_path(path)) {
                warn!(path = %path, error = %e, "touch failed");
                writeln!(io.stderr, "mytouch: {path}: {e}")?;
            }
        }
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("--help"))]
/// Create each named directory. Every name is attempted; failures are reported one by one.
pub struct Mkdir {
    #[argh(positional)]
    /// directories to create.
    pub paths: Vec<String>,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mymkdir"
    }

    fn execute(self, io: &mut Streams<'_>, env: &mut Environment) -> Result<Continuation> {
        if self.paths.is_empty() {
            bail!("mymkdir: expected at least one directory name");
        }

        let mut builder = DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o777);
        }

        for path in &self.paths {
            if let Err(e) = builder.create(env.resolve_path(path)) {
                warn!(path = %path, error = %e, "mkdir failed");
                writeln!(io.stderr, "mymkdir: {path}: {e}")?;
            }
        }
        Ok(Continuation::Continue)
    }
}
