//! Turns a token sequence into a pipeline description.
//!
//! Planning happens before any process is created, so every decision about
//! the invocation (stage boundaries, redirections, whether the pipeline runs
//! in the background) is made exactly once.

use std::path::PathBuf;

use crate::errors::{Error, Result};

const BACKGROUND: &str = "&";
const PIPE: &str = "|";
const REDIRECT_IN: &str = "<";
const REDIRECT_OUT: &str = ">";

/// One command of a pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stage {
    pub argv: Vec<String>,
    /// File to read standard input from, overriding any pipe.
    pub stdin: Option<PathBuf>,
    /// File to write standard output to, overriding any pipe.
    pub stdout: Option<PathBuf>,
}

impl Stage {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// A parsed invocation: one or more stages joined by pipes.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandPlan {
    pub stages: Vec<Stage>,
    pub background: bool,
}

impl CommandPlan {
    /// Scans `tokens` left to right.
    ///
    /// `&` ends the scan and backgrounds the pipeline; anything after it is
    /// ignored. `<` and `>` consume the following token as a filename, a
    /// repeated redirection replaces the earlier one. `|` starts a new stage.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<CommandPlan> {
        let mut stages = Vec::new();
        let mut current = Stage::default();
        let mut background = false;

        let mut tokens = tokens.iter().map(AsRef::as_ref);
        while let Some(token) = tokens.next() {
            match token {
                BACKGROUND => {
                    background = true;
                    break;
                }
                REDIRECT_IN => {
                    let path = redirect_target(tokens.next(), token)?;
                    current.stdin = Some(path);
                }
                REDIRECT_OUT => {
                    let path = redirect_target(tokens.next(), token)?;
                    current.stdout = Some(path);
                }
                PIPE => {
                    if current.argv.is_empty() {
                        return Err(Error::syntax(PIPE));
                    }
                    stages.push(current);
                    current = Stage::default();
                }
                word => current.argv.push(word.to_string()),
            }
        }

        if current.argv.is_empty() {
            let near = if stages.is_empty() && !background {
                "newline"
            } else if background {
                BACKGROUND
            } else {
                PIPE
            };
            return Err(Error::syntax(near));
        }
        stages.push(current);

        Ok(CommandPlan { stages, background })
    }
}

fn redirect_target(token: Option<&str>, operator: &str) -> Result<PathBuf> {
    match token {
        Some(t) if ![BACKGROUND, PIPE, REDIRECT_IN, REDIRECT_OUT].contains(&t) => {
            Ok(PathBuf::from(t))
        }
        Some(t) => Err(Error::syntax(t)),
        None => Err(Error::syntax(operator)),
    }
}
