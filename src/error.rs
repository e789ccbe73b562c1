//! Error taxonomy for jobsh
//!
//! Only [`ShellError::InputClosed`] is fatal. Every other variant is reported
//! at the prompt and the read loop carries on.

use nix::errno::Errno;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// End of input or a read error on the line source
    #[error("input closed")]
    InputClosed,
    /// Raised inside a child when the program image cannot be replaced.
    /// The parent only ever sees the resulting exit status.
    #[error("{program}: {errno}")]
    ExecFailure { program: String, errno: Errno },
    #[error("cd: {}: {source}", path.display())]
    DirectoryChange {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pwd: {0}")]
    WorkingDirectoryUnavailable(#[source] io::Error),
    #[error("fg: {0}: no such job")]
    JobNotFound(String),
    #[error("fork failed: {0}")]
    ChildCreation(Errno),
    #[error("wait failed for pid {pid}: {errno}")]
    Wait { pid: i32, errno: Errno },
    #[error("{}: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot combine '>' and '|' on one command line")]
    UnsupportedCombination,
    #[error("only a single '|' is supported")]
    UnsupportedPipeline,
    #[error("invalid argument: {0:?}")]
    InvalidArgument(String),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Whether this error ends the read loop
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::InputClosed)
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
