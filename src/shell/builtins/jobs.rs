use crate::shell::builtins::{self, prelude::*};

/// `jobs`: prints one line per tracked job, `<id> <name>`, in ascending id
/// order.
pub struct Jobs;

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const ARITY: usize = 0;

    fn run<T: AsRef<str>>(jobs: &mut JobTable, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        for job in jobs.iter() {
            writeln!(stdout, "{}", job).context(ErrorKind::Io)?;
        }
        stdout.flush().context(ErrorKind::Io)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nix::unistd::Pid;

    use super::*;
    use crate::shell::builtins::BuiltinCommand;

    #[test]
    fn test_jobs_empty_table_prints_nothing() {
        let mut jobs = JobTable::new();
        let mut stdout = Vec::new();
        Jobs::run::<&str>(&mut jobs, &[], &mut stdout).unwrap();
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_jobs_prints_id_and_name() {
        let mut jobs = JobTable::new();
        jobs.register(Pid::from_raw(20), "yes");
        jobs.register(Pid::from_raw(10), "sleep");

        let mut stdout = Vec::new();
        Jobs::run::<&str>(&mut jobs, &[], &mut stdout).unwrap();
        assert_eq!(String::from_utf8(stdout).unwrap(), "10 sleep\n20 yes\n");
    }
}
