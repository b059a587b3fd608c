use std::{ffi::OsStr, fmt, io, num::NonZeroI32, process};

use log::debug;

/// A child process invocation that reports failures as an [`Error`] carrying the command line.
pub struct Command(process::Command);

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self(process::Command::new(program))
    }

    pub fn args<'a, I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = &'a OsStr>,
    {
        self.0.args(args);
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.0.envs(vars);
        self
    }

    pub fn try_status(mut self) -> Result<ExitStatus, Error> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("running `{command:?}`...", command = &self.0);
        }

        match self.0.status() {
            Ok(status) => Ok(ExitStatus {
                command: self,
                status,
            }),
            Err(error) => Err(Error {
                command: self,
                kind: error.into(),
            }),
        }
    }

    /// Runs the command with inherited stdio and fails unless it exits successfully.
    pub fn status(self) -> Result<(), Error> {
        self.try_status().and_then(ExitStatus::require_success)
    }

    pub fn try_output(mut self) -> Result<Output, Error> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("capturing `{command:?}`...", command = &self.0);
        }

        match self.0.output() {
            Ok(output) => Ok(Output {
                command: self,
                output,
            }),
            Err(error) => Err(Error {
                command: self,
                kind: error.into(),
            }),
        }
    }

    /// Runs the command while capturing stdout and stderr and fails unless it exits successfully.
    pub fn output(self) -> Result<Output, Error> {
        self.try_output().and_then(Output::require_success)
    }
}

#[derive(Debug)]
pub struct ExitStatus {
    command: Command,
    status: process::ExitStatus,
}

impl ExitStatus {
    pub fn require_success(self) -> Result<(), Error> {
        let ExitStatus { command, status } = self;
        if status.success() {
            Ok(())
        } else {
            Err(Error {
                command,
                kind: ErrorKind::NonZeroExitStatus(status.code().and_then(NonZeroI32::new)),
            })
        }
    }
}

#[derive(Debug)]
pub struct Output {
    pub command: Command,
    pub output: process::Output,
}

impl Output {
    pub fn require_success(self) -> Result<Output, Error> {
        let Output { command, output } = self;
        if output.status.success() {
            Ok(Output { command, output })
        } else {
            Err(Error {
                command,
                kind: ErrorKind::NonZeroExitStatus(output.status.code().and_then(NonZeroI32::new)),
            })
        }
    }
}

impl std::ops::Deref for Output {
    type Target = process::Output;

    fn deref(&self) -> &Self::Target {
        &self.output
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Io(io::ErrorKind),
    NonZeroExitStatus(Option<NonZeroI32>),
}

impl From<io::Error> for ErrorKind {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            kind => ErrorKind::Io(kind),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    pub command: Command,
    pub kind: ErrorKind,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to run `{command:?}`: ",
            command = &self.command.0
        )?;
        let program = self.command.0.get_program().to_string_lossy();
        match self.kind {
            ErrorKind::NotFound => {
                write!(f, "the `{program}` command is required but not available on your system, please install it")
            }
            ErrorKind::PermissionDenied => {
                write!(f, "the `{program}` command is available but does not have the right permissions, please make sure the binary is executable")
            }
            ErrorKind::Io(kind) => {
                write!(f, "unable to start `{program}`: {kind}")
            }
            ErrorKind::NonZeroExitStatus(code) => {
                if let Some(code) = code {
                    write!(f, "exited with non-zero exit code `{code}`")
                } else {
                    write!(f, "did not run succesfully")
                }
            }
        }
    }
}

impl std::error::Error for Error {}

/// Creates a new [`Command`] and supplies the provided arguments, if any, while calling
/// [`std::convert::AsRef::as_ref`] on each.
macro_rules! command {
    ($program:expr $(,)?) => {
        $crate::process::Command::new($program)
    };
    ($program:expr, $($arg:expr),+ $(,)?) => {
        $crate::process::args!($crate::process::Command::new($program), $($arg,)*)
    };
}

/// Calls [`Command::args`] on the provided [`Command`] while calling [`std::convert::AsRef::as_ref`]
/// on each argument.
macro_rules! args {
    ($program:expr, $($arg:expr),+ $(,)?) => {
        $program.args([
            $(::std::convert::AsRef::<::std::ffi::OsStr>::as_ref(&$arg),)*
        ])
    }
}

pub(crate) use args;
pub(crate) use command;
