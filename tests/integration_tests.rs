//! Integration Tests


use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::process::Stdio;
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::workdir::WorkDir;

#[test]
fn test_version() {
    let wd = WorkDir::new("version");
    let stdout = wd.stdout(&mut wd.command(&["--version"]));
    assert_eq!(
        stdout,
        format!("minish version {}\n", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_simple_echo() {
    let wd = WorkDir::new("echo");
    let stdout = wd.stdout(&mut wd.command(&["-c", "echo test"]));
    assert_eq!(stdout, "test\n");
}

#[test]
fn test_redirect_output() {
    let wd = WorkDir::new("redirect_output");
    wd.output(&mut wd.command(&["-c", "echo hi > out.txt"]));

    assert_eq!(wd.read("out.txt"), "hi\n");
    let mode = fs::metadata(wd.path().join("out.txt"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[test]
fn test_redirect_input_and_output() {
    let wd = WorkDir::new("redirect_both");
    wd.create("in.txt", "needle\nhaystack\n");
    wd.output(&mut wd.command(&["-c", "grep needle < in.txt > out.txt"]));
    assert_eq!(wd.read("out.txt"), "needle\n");
}

#[test]
fn test_simple_pipeline() {
    let wd = WorkDir::new("pipeline");
    wd.create("infile", "one\ntwo\nthree\n");
    let stdout = wd.stdout(&mut wd.command(&["-c", "cat infile | wc -l"]));
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_command_not_found() {
    let wd = WorkDir::new("not_found");
    let output = wd.run_line("minish-no-such-command arg");
    assert_eq!(output.status.code(), Some(127));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "minish: minish-no-such-command: command not found\n"
    );
}

#[test]
fn test_missing_input_file() {
    let wd = WorkDir::new("missing_input");
    let output = wd.run_line("cat < missing.txt");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("minish: missing.txt: "));
}

#[test]
fn test_syntax_error() {
    let wd = WorkDir::new("syntax");
    let output = wd.run_line("echo >");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "minish: syntax error near: '>'\n"
    );
}

#[test]
fn test_exit_status() {
    let wd = WorkDir::new("exit");
    assert_eq!(wd.run_line("exit 85").status.code(), Some(85));
    assert_eq!(wd.run_line("quit").status.code(), Some(0));
    assert_eq!(wd.run_line("false").status.code(), Some(1));
}

#[test]
fn test_jobs_and_kill_without_jobs() {
    let wd = WorkDir::new("no_jobs");
    assert_eq!(wd.stdout(&mut wd.command(&["-c", "jobs"])), "");

    let output = wd.run_line("kill 9999");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

// The job writes to a file; an inherited stdout pipe would outlive the shell.
#[test]
fn test_background_job_is_listed() {
    let wd = WorkDir::new("background");
    let mut child = wd
        .command(&[] as &[&str])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"sleep 30 > sleep.out &\njobs\nexit\n")
        .unwrap();

    let started = Instant::now();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(started.elapsed() < Duration::from_secs(20));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let listed: Vec<i32> = stdout
        .lines()
        .map(|line| line.trim_start_matches("$ "))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [id, "sleep"] => id.parse().ok(),
                _ => None,
            }
        })
        .collect();
    assert_eq!(listed.len(), 1, "unexpected output: {}", stdout);
    assert!(stdout.contains(&format!("[{}]\n", listed[0])));

    let temp_result = signal::killpg(Pid::from_raw(listed[0]), Signal::SIGKILL);
    assert!(temp_result.is_ok());
}

#[test]
fn test_interrupt_is_relayed_to_foreground_pipeline() {
    let wd = WorkDir::new("relay");
    let mut child = wd.command(&["-c", "sleep 10"]).spawn().unwrap();
    let minish = Pid::from_raw(child.id() as i32);

    thread::sleep(Duration::from_millis(500));
    let started = Instant::now();
    signal::kill(minish, Signal::SIGINT).unwrap();

    let status = child.wait().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(status.code(), Some(130));
}

#[test]
fn test_quit_is_relayed_to_foreground_pipeline() {
    let wd = WorkDir::new("relay_quit");
    let mut child = wd.command(&["-c", "sleep 10"]).spawn().unwrap();
    let minish = Pid::from_raw(child.id() as i32);

    thread::sleep(Duration::from_millis(500));
    let started = Instant::now();
    signal::kill(minish, Signal::SIGQUIT).unwrap();

    let status = child.wait().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(status.code(), Some(131));
}

#[test]
fn test_interrupt_at_prompt_is_absorbed() {
    let wd = WorkDir::new("relay_idle");
    let mut child = wd
        .command(&[] as &[&str])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let minish = Pid::from_raw(child.id() as i32);

    thread::sleep(Duration::from_millis(500));
    signal::kill(minish, Signal::SIGINT).unwrap();
    signal::kill(minish, Signal::SIGQUIT).unwrap();
    thread::sleep(Duration::from_millis(100));

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"echo still here\nexit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("still here\n"));
}

#[test]
fn test_foreground_pipeline_reads_terminal() {
    let wd = WorkDir::new("terminal_read");
    let mut term = wd.spawn_on_terminal();
    term.expect_count("$ ", 1);

    term.type_line("cat");
    thread::sleep(Duration::from_millis(300));
    term.type_line("hello from the terminal");
    // once echoed by the terminal, once written back by cat
    term.expect_count("hello from the terminal", 2);

    term.type_bytes(b"\x04");
    term.expect_count("$ ", 2);
    term.type_line("exit");
    assert!(term.wait().success());
}

#[test]
fn test_terminal_interrupt_stops_foreground_pipeline_only() {
    let wd = WorkDir::new("terminal_interrupt");
    let mut term = wd.spawn_on_terminal();
    term.expect_count("$ ", 1);

    term.type_line("cat");
    thread::sleep(Duration::from_millis(300));
    term.type_bytes(b"\x03");
    term.expect_count("$ ", 2);

    term.type_line("exit");
    assert_eq!(term.wait().code(), Some(130));
}

#[test]
fn test_terminal_interrupt_at_prompt_is_absorbed() {
    let wd = WorkDir::new("terminal_idle");
    let mut term = wd.spawn_on_terminal();
    term.expect_count("$ ", 1);

    term.type_bytes(b"\x03");
    thread::sleep(Duration::from_millis(300));
    term.type_line("echo still here");
    term.expect_count("still here", 2);

    term.type_line("exit");
    assert!(term.wait().success());
}
