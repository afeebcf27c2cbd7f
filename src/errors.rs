//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::path::Path;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    /// Returns `true` if the interpreter cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        match *self.kind() {
            ErrorKind::Spawn(_) => true,
            _ => false,
        }
    }

    pub(crate) fn syntax<T: AsRef<str>>(line: T) -> Error {
        Error::from(ErrorKind::Syntax(line.as_ref().to_string()))
    }

    pub(crate) fn command_not_found<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::CommandNotFound(command.as_ref().to_string()))
    }

    pub(crate) fn permission_denied<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::PermissionDenied(command.as_ref().to_string()))
    }

    pub(crate) fn redirect<P: AsRef<Path>, E: fmt::Display>(path: P, reason: E) -> Error {
        Error::from(ErrorKind::Redirect {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        })
    }

    pub(crate) fn spawn<T: AsRef<str>, E: fmt::Display>(command: T, reason: E) -> Error {
        Error::from(ErrorKind::Spawn(format!(
            "{}: {}",
            command.as_ref(),
            reason
        )))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ctx, f)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Syntax(String),
    CommandNotFound(String),
    PermissionDenied(String),
    Redirect { path: String, reason: String },
    Spawn(String),
    Docopt,
    Io,
    Nix,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::Syntax(ref token) => write!(f, "syntax error near: '{}'", token),
            ErrorKind::CommandNotFound(ref command) => write!(f, "{}: command not found", command),
            ErrorKind::PermissionDenied(ref command) => write!(f, "{}: permission denied", command),
            ErrorKind::Redirect {
                ref path,
                ref reason,
            } => write!(f, "{}: {}", path, reason),
            ErrorKind::Spawn(ref message) => write!(f, "fork failed: {}", message),
            ErrorKind::Docopt => write!(f, "Docopt error occurred"),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
