//! jobsh - a small job-control shell
//!
//! # Overview
//!
//! jobsh reads a line, splits it into words and either runs a built-in or
//! launches a program. A line may end in `&` to run in the background, send
//! its output to a file with `>`, or connect two programs with a single `|`.
//!
//! ```text
//! >> sleep 5 &
//! [1] 4211
//! >> ls | wc -l
//! 12
//! >> echo hello > greeting.txt
//! >> jobs
//! [1] 4211
//! >> fg 1
//! ```
//!
//! # Built-ins
//!
//! `echo`, `cd`, `pwd`, `exit`, `fg` and `jobs`. Everything else is looked up
//! on `PATH`.
//!
//! # Job control
//!
//! Background jobs are numbered from 1 and keep their number until they
//! finish. A reaper thread collects them as they exit; finished jobs are
//! announced before the next prompt. Ctrl+C terminates the foreground
//! process and leaves the shell and its background jobs alone.
//!
//! # Example
//!
//! ```no_run
//! use jobsh::{Config, Shell};
//!
//! let mut shell = Shell::new(Config::default()).unwrap();
//! let mut out = Vec::new();
//! shell.execute_line("echo hello", &mut out).unwrap();
//! assert_eq!(out, b"hello\n");
//! ```

#[cfg(not(unix))]
compile_error!("jobsh only runs on Unix platforms");

pub mod builtins;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod jobs;
pub mod launcher;
pub mod lexer;
pub mod planner;
pub mod shell;
pub mod signals;

// Re-export commonly used items
pub use config::Config;
pub use context::ShellContext;
pub use error::{Result, ShellError};
pub use input::{BufReadSource, LineSource};
pub use jobs::{ChildStatus, Completion, Job, JobId, JobRegistry};
pub use launcher::{launch, Launched};
pub use lexer::{tokenize, CommandLine};
pub use planner::{plan, CommandPlan};
pub use shell::{Flow, Shell};
pub use signals::SignalLayer;
