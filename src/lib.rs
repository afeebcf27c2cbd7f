//! Minish - a minimal interactive command interpreter
//!
//! A command line is split into whitespace separated tokens and run as a
//! pipeline of external programs, with optional `<`/`>` redirections and a
//! trailing `&` to run it in the background as a tracked job.

#![deny(
    missing_debug_implementations,
    trivial_casts,
    unused_import_braces
)]

#[macro_use]
extern crate log;

#[macro_use]
mod util;

pub mod core;
mod editor;
pub mod errors;
pub mod shell;

pub use crate::core::{
    command::{CommandPlan, Stage},
    job::{Job, JobTable},
    tokenizer::tokenize,
};
pub use crate::shell::{
    execute_command::{execute, Outcome},
    Shell, ShellConfig,
};
pub use crate::util::MinishExitStatusExt;
