//! jobsh - a small job-control shell
//!
//! Usage:
//!   jobsh             Start an interactive shell
//!   jobsh -c "cmd"    Execute a single command line

mod cli;
mod repl;

use cli::{configure, execute_command, parse_args, print_help, print_version, session_exit};
use jobsh::config::BANNER;
use jobsh::{BufReadSource, Shell};
use repl::EditorSource;
use std::env;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args);

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if cli.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = configure(&cli);
    if config.banner {
        println!("{}", BANNER);
    }

    if let Some(cmd) = cli.command {
        return execute_command(config, &cmd);
    }

    let mut shell = match Shell::new(config) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("jobsh: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let result = if stdin.is_terminal() {
        match EditorSource::new() {
            Ok(mut source) => shell.run(&mut source),
            Err(e) => {
                eprintln!("jobsh: could not start line editor: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        let mut source = BufReadSource::new(stdin.lock(), io::stdout());
        shell.run(&mut source)
    };

    session_exit(result)
}
