//! Common test utilities for jobsh integration tests

use assert_cmd::Command;
use std::path::Path;

/// The jobsh binary with a clean configuration and an empty prompt, so
/// stdout holds only command output.
pub fn jobsh() -> Command {
    let mut cmd = Command::cargo_bin("jobsh").unwrap();
    cmd.env_remove("JOBSH_BANNER")
        .env_remove("JOBSH_EXIT_KILLS_JOBS")
        .env_remove("RUST_LOG")
        .env("JOBSH_PROMPT", "");
    cmd
}

/// Run a single command line via `-c`
#[allow(dead_code)]
pub fn run_command(line: &str) -> Command {
    let mut cmd = jobsh();
    cmd.arg("-c").arg(line);
    cmd
}

/// Feed a whole session through stdin
#[allow(dead_code)]
pub fn run_session(input: &str) -> Command {
    let mut cmd = jobsh();
    cmd.write_stdin(input.to_string());
    cmd
}

/// Resolved path, as `pwd` reports it
#[allow(dead_code)]
pub fn resolved(path: &Path) -> String {
    path.canonicalize().unwrap().display().to_string()
}
