use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::shell::builtins::{self, prelude::*};

/// `kill <id>`: interrupts a background job.
///
/// Sends SIGINT to the process group of the job identified by `id`, as listed
/// by `jobs`. Ids that are not tracked, or are not numbers, are ignored. The
/// job stays listed until its processes have exited.
pub struct Kill;

impl builtins::BuiltinCommand for Kill {
    const NAME: &'static str = builtins::KILL_NAME;

    const ARITY: usize = 1;

    fn run<T: AsRef<str>>(jobs: &mut JobTable, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let id = Pid::from_raw(parse_id(args[0].as_ref()));
        if !jobs.contains(id) {
            debug!("kill: {}: no such job", args[0].as_ref());
            return Ok(());
        }

        // Every stage of the job shares the job's process group.
        let temp_result = signal::killpg(id, Signal::SIGINT);
        log_if_err!(temp_result, "kill: failed to interrupt job {}", id);
        Ok(())
    }
}

/// Parses a job id, treating anything unparseable as 0, which is never a job.
fn parse_id(arg: &str) -> i32 {
    arg.parse::<i32>().unwrap_or(0)
}
