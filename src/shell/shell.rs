//! Minish - Shell Module
//!
//! The Shell reads command lines, hands them to the execution engine, and
//! owns the job table across them. It is also responsible for reaping
//! finished background jobs and for the `exit`/`quit` commands.

use std::fmt;
use std::io;
use std::process::{self, ExitStatus};

use crate::core::{job::JobTable, tokenizer::tokenize};
use crate::editor::Editor;
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::{
    execute_command::{self, Outcome},
    signal_relay, ShellConfig,
};
use crate::util::{
    MinishExitStatusExt, COMMAND_NOT_FOUND_EXIT_STATUS, PERMISSION_DENIED_EXIT_STATUS,
    SYNTAX_ERROR_EXIT_STATUS,
};

const PROMPT: &str = "$ ";
const EXIT_NAME: &str = "exit";
const QUIT_NAME: &str = "quit";

/// Minish Shell
pub struct Shell {
    /// Responsible for readline and history.
    editor: Editor,
    jobs: JobTable,
    /// Exit status of last command executed.
    last_exit_status: ExitStatus,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a new Shell and starts relaying terminal signals to the
    /// pipelines it runs.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        let shell = Shell {
            editor: Editor::with_capacity(config.command_history_capacity)?,
            jobs: JobTable::new(),
            last_exit_status: ExitStatus::from_success(),
            config,
        };

        signal_relay::install()?;

        info!("minish started up");
        Ok(shell)
    }

    /// Runs one command line.
    ///
    /// Errors the user can act on (syntax, unknown programs, unreadable
    /// files) are reported on stderr and recorded in the exit status. Other
    /// errors are returned; `Error::is_fatal` tells whether the shell may
    /// keep going.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Ok(());
        }

        if self.config.enable_command_history {
            self.editor.add_history_entry(input.trim());
        }

        if tokens[0] == EXIT_NAME || tokens[0] == QUIT_NAME {
            let status = tokens.get(1).map(|arg| parse_exit_status(arg));
            self.exit(status);
        }

        let job_name = tokens[0];
        let result = execute_command::execute(
            &tokens,
            job_name,
            &mut self.jobs,
            &mut io::stdout().lock(),
        );
        match result {
            Ok(Outcome::Background(job)) => {
                if self.config.display_messages {
                    println!("[{}]", job.id());
                }
                self.last_exit_status = ExitStatus::from_success();
            }
            Ok(outcome) => self.last_exit_status = outcome.exit_status(),
            Err(e) => self.report_error(e)?,
        }

        Ok(())
    }

    /// Runs command lines from stdin until EOF is received.
    pub fn execute_from_stdin(&mut self) {
        loop {
            self.reap_jobs();

            let input = match self.editor.readline(PROMPT) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                e => {
                    log_if_err!(e, "prompt");
                    continue;
                }
            };

            if let Err(e) = self.execute_command_string(&input) {
                if e.is_fatal() {
                    eprintln!("minish: {}", e);
                    self.exit(Some(ExitStatus::from_failure()));
                }
                error!("execute_command_string: {}", e);
            }
        }
    }

    /// Exit the shell.
    ///
    /// Valid exit codes are between 0 and 255. Like bash and its descendents, it automatically
    /// converts exit codes to a u8 such that positive n becomes n % 256 and negative n becomes
    /// (256 + n) % 256.
    ///
    /// Exit the shell with a status of n. If n is None, then the exit status is that of the last
    /// command executed.
    pub fn exit(&mut self, n: Option<ExitStatus>) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        let status = n.unwrap_or(self.last_exit_status);
        let code = status_code(status);
        let code_like_u8 = if code < 0 {
            (256 + code % 256) % 256
        } else {
            code % 256
        };

        if !self.jobs.is_empty() {
            warn!("exiting with {} background jobs still running", self.jobs.len());
        }

        info!("minish has shut down");
        process::exit(code_like_u8);
    }

    /// Removes finished background jobs, announcing them when configured to.
    fn reap_jobs(&mut self) {
        for job in self.jobs.reap() {
            if self.config.display_messages {
                println!("[{}]+\tDone\t{}", job.id(), job.name());
            }
        }
    }

    fn report_error(&mut self, e: Error) -> Result<()> {
        let status = match *e.kind() {
            ErrorKind::Syntax(_) => SYNTAX_ERROR_EXIT_STATUS,
            ErrorKind::CommandNotFound(_) => COMMAND_NOT_FOUND_EXIT_STATUS,
            ErrorKind::PermissionDenied(_) => PERMISSION_DENIED_EXIT_STATUS,
            ErrorKind::Redirect { .. } => 1,
            _ => return Err(e),
        };

        eprintln!("minish: {}", e);
        self.last_exit_status = ExitStatus::from_status(status);
        Ok(())
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}\n{:?}", self.jobs, self.editor)
    }
}

fn parse_exit_status(arg: &str) -> ExitStatus {
    let code = arg.parse::<i32>().unwrap_or_else(|_| {
        eprintln!("minish: exit: {}: numeric argument required", arg);
        SYNTAX_ERROR_EXIT_STATUS
    });
    ExitStatus::from_status(code)
}

/// Exit code of `status`, mapping death by signal n to 128 + n.
fn status_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|n| 128 + n))
        .unwrap_or(1)
}
