use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Logs the error of a `Result` at the error level and moves on.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            error!("{}: {}", format!($fmt, $($arg)*), e);
        }
    }};
}

/// Exit status returned when a command line is malformed.
pub const SYNTAX_ERROR_EXIT_STATUS: i32 = 2;
/// Exit status returned when a program exists but cannot be executed.
pub const PERMISSION_DENIED_EXIT_STATUS: i32 = 126;
/// Exit status returned when a program cannot be found.
pub const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;

/// Minish Utility Extensions for `ExitStatus`
pub trait MinishExitStatusExt {
    /// Create an ExitStatus to indicate *successful* program execution.
    fn from_success() -> Self;

    /// Create an ExitStatus to indicate *unsuccessful* program execution.
    fn from_failure() -> Self;

    /// Create an ExitStatus from a status code
    fn from_status(code: i32) -> Self;
}

impl MinishExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use minish::MinishExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_success().success());
    /// ```
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    /// # Examples
    /// ```rust
    /// use minish::MinishExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(!ExitStatus::from_failure().success());
    /// ```
    fn from_failure() -> Self {
        ExitStatus::from_status(1)
    }

    /// # Examples
    /// ```rust
    /// use minish::MinishExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_status(0).success());
    /// assert!(!ExitStatus::from_status(1).success());
    /// ```
    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw(code << 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_round_trips_code() {
        assert_eq!(ExitStatus::from_status(127).code(), Some(127));
        assert_eq!(ExitStatus::from_failure().code(), Some(1));
    }
}
