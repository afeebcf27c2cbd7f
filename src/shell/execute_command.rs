use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

use failure::{Fail, ResultExt};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::core::command::{CommandPlan, Stage};
use crate::core::job::{Job, JobTable};
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::builtins;
use crate::shell::signal_relay::{self, ForegroundGuard};
use crate::util::MinishExitStatusExt;

/// Permissions given to files created by `>`.
const OUTPUT_FILE_MODE: u32 = 0o644;

/// What running one command line amounted to.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The line held no command.
    Empty,
    /// A builtin ran to completion.
    Builtin,
    /// A foreground pipeline finished with the status of its last stage.
    Foreground(ExitStatus),
    /// A pipeline was started in the background and registered as a job.
    Background(Job),
}

impl Outcome {
    pub fn exit_status(&self) -> ExitStatus {
        match *self {
            Outcome::Foreground(status) => status,
            _ => ExitStatus::from_success(),
        }
    }
}

/// Runs one tokenized command line.
///
/// Builtins are dispatched directly. Everything else is planned into a
/// pipeline, launched as a new process group, and then either waited on or
/// registered in `jobs` under `job_name` when it ends with `&`.
pub fn execute<S: AsRef<str>>(
    tokens: &[S],
    job_name: &str,
    jobs: &mut JobTable,
    stdout: &mut dyn Write,
) -> Result<Outcome> {
    match tokens.first() {
        None => return Ok(Outcome::Empty),
        Some(first) if first.as_ref().is_empty() => return Ok(Outcome::Empty),
        _ => {}
    }

    if builtins::is_builtin(tokens) {
        builtins::run(jobs, tokens, stdout)?;
        return Ok(Outcome::Builtin);
    }

    let plan = CommandPlan::parse(tokens)?;
    debug!("{:?}", plan);

    let (process_group, spawn_error) = spawn_pipeline(&plan);
    let outcome = match process_group {
        None => None,
        Some(group) if plan.background => {
            let job = Job::new(group.id, job_name);
            jobs.register(job.id(), job.name());
            info!("started job {}", job);
            Some(Outcome::Background(job))
        }
        Some(group) => Some(Outcome::Foreground(group.wait()?)),
    };

    match (spawn_error, outcome) {
        (Some(e), _) => Err(e),
        (None, Some(outcome)) => Ok(outcome),
        (None, None) => unreachable!("a plan always has at least one stage"),
    }
}

/// The processes of one pipeline, all members of the process group `id`.
pub struct ProcessGroup {
    pub id: Pid,
    children: Vec<Child>,
}

impl ProcessGroup {
    pub fn pids(&self) -> Vec<Pid> {
        self.children
            .iter()
            .map(|c| Pid::from_raw(c.id() as i32))
            .collect()
    }

    /// Waits for every process while the group is in the foreground.
    /// Returns the exit status of the last process.
    ///
    /// Stop signals (^Z, terminal access) are not supported, so a stopped
    /// process is resumed rather than left to block the wait.
    pub fn wait(&self) -> Result<ExitStatus> {
        let _foreground = ForegroundGuard::new(self.id);
        let mut last_status = ExitStatus::from_success();
        for pid in self.pids() {
            last_status = wait_for_exit(self.id, pid)?;
            debug!("process {} exited: {}", pid, last_status);
        }

        Ok(last_status)
    }
}

fn wait_for_exit(pgid: Pid, pid: Pid) -> Result<ExitStatus> {
    loop {
        match wait::waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus::from_status(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(ExitStatus::from_raw(sig as i32)),
            Ok(WaitStatus::Stopped(_, sig)) => {
                debug!("process {} stopped by {:?}, resuming it", pid, sig);
                signal::killpg(pgid, Signal::SIGCONT).context(ErrorKind::Nix)?;
            }
            Ok(_) | Err(Errno::EINTR) => {}
            Err(e) => return Err(e.context(ErrorKind::Nix).into()),
        }
    }
}

impl fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pgid: {}\tpids: {:?}", self.id, self.pids())
    }
}

/// Spawns every stage of `plan` into one new process group.
///
/// Stops at the first stage that cannot be set up. The processes spawned
/// before that point are still returned so the caller can wait for them or
/// track them, together with the error.
fn spawn_pipeline(plan: &CommandPlan) -> (Option<ProcessGroup>, Option<Error>) {
    let mut group: Option<ProcessGroup> = None;
    let mut pipe: Option<ChildStdout> = None;
    let last_index = plan.stages.len() - 1;

    for (index, stage) in plan.stages.iter().enumerate() {
        let pgid = group.as_ref().map(|g| g.id);
        // A writer whose output went to a file leaves its reader an empty input.
        let upstream = if index == 0 {
            None
        } else {
            Some(pipe.take().map_or_else(Stdio::null, Stdio::from))
        };
        let result = spawn_stage(stage, upstream, index < last_index, pgid);
        match result {
            Ok(mut child) => {
                pipe = child.stdout.take();
                let pid = Pid::from_raw(child.id() as i32);
                group
                    .get_or_insert_with(|| ProcessGroup {
                        id: pid,
                        children: Vec::new(),
                    })
                    .children
                    .push(child);
            }
            Err(e) => {
                warn!("failed to launch stage {} ({}): {}", index, stage.program(), e);
                return (group, Some(e));
            }
        }
    }

    (group, None)
}

fn spawn_stage(
    stage: &Stage,
    upstream: Option<Stdio>,
    pipe_output: bool,
    pgid: Option<Pid>,
) -> Result<Child> {
    // simple commands prefer file redirects to piping, following bash's behavior
    let stdin: Stdio = match (&stage.stdin, upstream) {
        (Some(path), _) => open_input(path)?.into(),
        (None, Some(upstream)) => upstream,
        (None, None) => Stdio::inherit(),
    };
    let stdout: Stdio = match &stage.stdout {
        Some(path) => open_output(path)?.into(),
        None if pipe_output => Stdio::piped(),
        None => Stdio::inherit(),
    };

    let mut command = Command::new(OsStr::new(stage.program()));
    command
        .args(stage.args().iter().map(OsStr::new))
        .stdin(stdin)
        .stdout(stdout)
        .process_group(pgid.map_or(0, Pid::as_raw));
    // The interpreter may have inherited ignored dispositions, which exec keeps.
    unsafe {
        command.pre_exec(|| signal_relay::reset_to_default().map_err(io::Error::from));
    }

    let child = command.spawn().map_err(|e| spawn_error(stage.program(), e))?;
    debug!(
        "spawned {} ({}) in process group {}",
        stage.program(),
        child.id(),
        pgid.map_or(child.id() as i32, Pid::as_raw)
    );

    Ok(child)
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::redirect(path, e))
}

fn open_output(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_FILE_MODE)
        .open(path)
        .map_err(|e| Error::redirect(path, e))?;
    fs::set_permissions(path, Permissions::from_mode(OUTPUT_FILE_MODE))
        .map_err(|e| Error::redirect(path, e))?;
    Ok(file)
}

fn spawn_error(program: &str, e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::NotFound => Error::command_not_found(program),
        io::ErrorKind::PermissionDenied => Error::permission_denied(program),
        _ => Error::spawn(program, e),
    }
}
