use std::path::PathBuf;
use std::process::{self, ExitStatus};

use docopt::Docopt;
use log::{debug, error, warn};
use minish::errors::Result;
use minish::{MinishExitStatusExt, Shell, ShellConfig};
use nix::unistd::Pid;
use serde::Deserialize;

const COMMAND_HISTORY_CAPACITY: usize = 10;
const LOG_FILE_NAME: &str = ".minish_log";

const USAGE: &str = "
minish.

Usage:
    minish [options]
    minish [options] -c <command>
    minish (-h | --help)
    minish --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              If the -c option is present, then the command is read from the first
                        non-option argument command_string.
    --log=<path>    File to write log to, defaults to ~/.minish_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("minish version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c {
        execute_from_command_string(args.arg_command.as_deref().unwrap_or_default());
    } else {
        execute_from_stdin();
    }
}

fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("minish: {}: {}", log_path.display(), e);
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("minish: failed to initialize logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    let home = dirs::home_dir();
    if home.is_none() {
        warn!("unable to get home directory");
    }
    home.map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string(command: &str) -> ! {
    let mut shell = create_shell(ShellConfig::noninteractive());
    let result = shell.execute_command_string(command);
    exit(result, &mut shell);
}

fn execute_from_stdin() -> ! {
    let mut shell = create_shell(ShellConfig::interactive(COMMAND_HISTORY_CAPACITY));
    shell.execute_from_stdin();
    shell.exit(None)
}

fn create_shell(config: ShellConfig) -> Shell {
    Shell::new(config).unwrap_or_else(|e| {
        error!("failed to create shell: {}", e);
        eprintln!("minish: {}", e);
        process::exit(1);
    })
}

fn exit(result: Result<()>, shell: &mut Shell) -> ! {
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("minish: {}", e);
        shell.exit(Some(ExitStatus::from_failure()));
    } else {
        shell.exit(None);
    }
}
