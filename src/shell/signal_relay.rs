//! Forwards terminal interrupt and quit signals to the foreground pipeline.
//!
//! Every pipeline runs in its own process group. When the interpreter
//! controls a terminal, the foreground pipeline's group is made the
//! terminal's foreground process group while it runs, so it may read the
//! terminal and receives ^C and ^\ straight from the tty driver. Signals that
//! reach the interpreter instead (sent to it directly, or with no terminal at
//! all) are passed on to whichever process group is in the foreground and
//! otherwise absorbed, keeping the interpreter alive.
//! Caught signals revert to their default action on exec; ignored ones do
//! not, so children reset them before exec.

use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use failure::ResultExt;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{self, Pid};

use crate::errors::{ErrorKind, Result};

const NO_FOREGROUND: i32 = 0;

const SHELL_TERMINAL: RawFd = libc::STDIN_FILENO;

static FOREGROUND_PGID: AtomicI32 = AtomicI32::new(NO_FOREGROUND);

/// Set once the interpreter owns the terminal on its stdin.
static CONTROLS_TERMINAL: AtomicBool = AtomicBool::new(false);

const RELAYED_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Dispositions a child gets back before exec.
const CHILD_DEFAULT_SIGNALS: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

extern "C" fn relay(signum: libc::c_int) {
    let pgid = FOREGROUND_PGID.load(Ordering::SeqCst);
    if pgid != NO_FOREGROUND {
        // killpg(2) is async-signal-safe
        unsafe {
            libc::killpg(pgid, signum);
        }
    }
}

/// Installs the relay handlers for SIGINT and SIGQUIT on this process.
///
/// If stdin is a terminal whose foreground process group is the
/// interpreter's, foreground pipelines are handed the terminal from now on.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(relay),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in &RELAYED_SIGNALS {
        unsafe { signal::sigaction(*sig, &action) }.context(ErrorKind::Nix)?;
    }
    debug!("installed signal relay for {:?}", RELAYED_SIGNALS);

    if owns_terminal() {
        // Taking the terminal back from a pipeline happens from the background.
        unsafe { signal::signal(Signal::SIGTTOU, SigHandler::SigIgn) }.context(ErrorKind::Nix)?;
        CONTROLS_TERMINAL.store(true, Ordering::SeqCst);
        debug!("handing the terminal to foreground pipelines");
    }

    Ok(())
}

fn owns_terminal() -> bool {
    unistd::isatty(SHELL_TERMINAL).unwrap_or(false)
        && unistd::tcgetpgrp(SHELL_TERMINAL).ok() == Some(unistd::getpgrp())
}

/// Restores the default dispositions of the signals the interpreter catches
/// or ignores.
///
/// Runs in forked children between `fork` and `exec`, so it only makes
/// async-signal-safe calls.
pub fn reset_to_default() -> nix::Result<()> {
    for sig in &CHILD_DEFAULT_SIGNALS {
        unsafe { signal::signal(*sig, SigHandler::SigDfl) }?;
    }

    Ok(())
}

/// RAII guard naming the process group that receives relayed signals.
///
/// When the interpreter controls a terminal, the group also becomes the
/// terminal's foreground process group until the guard is dropped. The
/// previous relay target and the terminal are restored on drop.
#[derive(Debug)]
pub struct ForegroundGuard {
    previous: i32,
    has_terminal: bool,
}

impl ForegroundGuard {
    pub fn new(pgid: Pid) -> ForegroundGuard {
        debug!("relaying signals to process group {}", pgid);
        let previous = FOREGROUND_PGID.swap(pgid.as_raw(), Ordering::SeqCst);

        let has_terminal = CONTROLS_TERMINAL.load(Ordering::SeqCst) && give_terminal(pgid);
        ForegroundGuard {
            previous,
            has_terminal,
        }
    }
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        if self.has_terminal {
            let temp_result = unistd::tcsetpgrp(SHELL_TERMINAL, unistd::getpgrp());
            log_if_err!(temp_result, "failed to take back the terminal");
        }
        FOREGROUND_PGID.store(self.previous, Ordering::SeqCst);
    }
}

fn give_terminal(pgid: Pid) -> bool {
    if let Err(e) = unistd::tcsetpgrp(SHELL_TERMINAL, pgid) {
        warn!("failed to give the terminal to process group {}: {}", pgid, e);
        return false;
    }

    // Stages that read the terminal before the handoff were stopped by SIGTTIN.
    let temp_result = signal::killpg(pgid, Signal::SIGCONT);
    log_if_err!(temp_result, "killpg({}, SIGCONT)", pgid);
    true
}
