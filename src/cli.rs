use jobsh::config::{Config, BANNER};
use jobsh::{Flow, Shell, ShellError};
use std::io;
use std::process::ExitCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed command-line arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub(crate) command: Option<String>,
    pub(crate) help: bool,
    pub(crate) version: bool,
    pub(crate) banner: bool,
}

/// Parse command-line arguments
pub(crate) fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs::default();

    let mut i = 1; // Skip program name
    while i < args.len() {
        match args[i].as_str() {
            "-c" => {
                // Everything after -c is the command
                if i + 1 < args.len() {
                    cli.command = Some(args[i + 1..].join(" "));
                    break;
                }
            }
            "--help" | "-h" => {
                cli.help = true;
            }
            "--version" | "-V" => {
                cli.version = true;
            }
            "--banner" => {
                cli.banner = true;
            }
            other => {
                log::warn!("ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    cli
}

pub(crate) fn print_help() {
    println!(
        r#"jobsh-{} - A small job-control shell

USAGE:
    jobsh                   Start an interactive shell
    jobsh -c <command>      Execute a single command line
    jobsh --banner          Print the startup banner
    jobsh --help            Show this help message
    jobsh --version         Show version

SYNTAX:
    cmd args...             Run a program found on PATH
    cmd args... &           Run in the background
    cmd args... > file      Send stdout to file (created or truncated)
    cmd1 args | cmd2 args   Connect two programs with a pipe

BUILTINS:
    echo [args...]          Print arguments separated by spaces
    cd [dir]                Change directory (no argument prints it)
    pwd                     Print working directory
    jobs                    List background jobs as [id] pid
    fg <id>                 Wait for a background job: fg 2, fg %2
    exit [code]             Leave the shell

ENVIRONMENT:
    JOBSH_PROMPT            Prompt string (default ">> ")
    JOBSH_BANNER=1          Print "{}" at startup
    JOBSH_EXIT_KILLS_JOBS=1 Terminate background jobs on exit
    RUST_LOG                Log filter (default "warn")

KEYS:
    Ctrl+C                  Terminate the foreground program
    Ctrl+D                  Close input and leave the shell
"#,
        VERSION, BANNER
    );
}

pub(crate) fn print_version() {
    println!("jobsh-{}", VERSION);
}

/// Apply command-line overrides to the environment configuration
pub(crate) fn configure(cli: &CliArgs) -> Config {
    let mut config = Config::from_env();
    if cli.banner {
        config.banner = true;
    }
    config
}

/// Execute a single command line and exit with its status
pub(crate) fn execute_command(config: Config, cmd: &str) -> ExitCode {
    let mut shell = match Shell::new(config) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("jobsh: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match shell.execute_line(cmd, &mut io::stdout()) {
        Ok(Flow::Exit(code)) => exit_code(code),
        Ok(Flow::Continue) => exit_code(shell.last_status()),
        Err(e) => {
            shell.report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Map the result of an interactive session to the process exit code
pub(crate) fn session_exit(result: jobsh::Result<i32>) -> ExitCode {
    match result {
        Ok(code) => exit_code(code),
        Err(ShellError::InputClosed) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("jobsh: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from((code & 0xff) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn no_arguments_is_interactive() {
        assert_eq!(parse_args(&args("jobsh")), CliArgs::default());
    }

    #[test]
    fn command_takes_the_rest() {
        let cli = parse_args(&args("jobsh --banner -c echo -h hi"));
        assert!(cli.banner);
        assert!(!cli.help);
        assert_eq!(cli.command.as_deref(), Some("echo -h hi"));
    }

    #[test]
    fn flags() {
        let cli = parse_args(&args("jobsh -V --help"));
        assert!(cli.version);
        assert!(cli.help);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn dangling_command_flag_is_ignored() {
        assert_eq!(parse_args(&args("jobsh -c")).command, None);
    }
}
