//! Minish builtins
//!
//! Builtins are recognized only when the whole command line matches their
//! exact shape, e.g. `jobs` with no arguments or `kill` with exactly one.
//! Anything else with the same name is run as an external program.

use self::prelude::*;

use self::jobs::Jobs;
use self::kill::Kill;

pub mod prelude {
    pub use std::io::Write;

    pub use failure::ResultExt;

    pub use crate::core::job::JobTable;
    pub use crate::errors::{ErrorKind, Result};
}

mod jobs;
mod kill;

const JOBS_NAME: &str = "jobs";
const KILL_NAME: &str = "kill";

/// Represents a Minish builtin command such as jobs or kill.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The exact number of arguments, excluding the name, the builtin takes.
    const ARITY: usize;
    /// Returns `true` if `argv` is an invocation of this builtin.
    fn matches<T: AsRef<str>>(argv: &[T]) -> bool {
        argv.len() == Self::ARITY + 1 && argv[0].as_ref() == Self::NAME
    }
    /// Runs the command with the given arguments against the job table.
    fn run<T: AsRef<str>>(jobs: &mut JobTable, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(argv: &[T]) -> bool {
    Jobs::matches(argv) || Kill::matches(argv)
}

/// precondition: `argv` is a builtin invocation.
pub fn run<T: AsRef<str>>(jobs: &mut JobTable, argv: &[T], stdout: &mut dyn Write) -> Result<()> {
    debug_assert!(is_builtin(argv));

    let args = &argv[1..];
    match argv[0].as_ref() {
        JOBS_NAME => Jobs::run(jobs, args, stdout),
        KILL_NAME => Kill::run(jobs, args, stdout),
        _ => unreachable!(),
    }
}
