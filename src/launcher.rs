//! Process launcher: fork, wire stdio according to the plan, exec
//!
//! Everything a child needs is converted to C strings before forking, and the
//! child only touches its own file descriptors before replacing its image.

use crate::context::ShellContext;
use crate::error::{Result, ShellError};
use crate::jobs::{ChildStatus, Job};
use crate::planner::CommandPlan;
use log::debug;
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::signal::{kill, signal, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, pipe, ForkResult, Pid};
use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::path::PathBuf;

/// Exit status of a child whose program could not be started
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// Exit status of a child that failed while wiring its stdio
const SETUP_FAILURE_STATUS: i32 = 1;

/// Where a launched child runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Foreground,
    Background,
}

/// An argument vector ready for exec
#[derive(Debug, Clone)]
pub struct Program {
    argv: Vec<CString>,
}

impl Program {
    pub fn new(args: &[String]) -> Result<Self> {
        let argv = args
            .iter()
            .map(|arg| {
                CString::new(arg.as_str()).map_err(|_| ShellError::InvalidArgument(arg.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Program { argv })
    }

    pub fn name(&self) -> Option<&CString> {
        self.argv.first()
    }

    /// Replace the current process image. Only returns on failure.
    ///
    /// `execvp` appends the terminating null pointer to the vector it hands
    /// to the kernel.
    fn exec(&self) -> ShellError {
        let Some(name) = self.name() else {
            return ShellError::InvalidArgument(String::new());
        };
        match execvp(name, &self.argv) {
            Ok(never) => match never {},
            Err(errno) => ShellError::ExecFailure {
                program: name.to_string_lossy().into_owned(),
                errno,
            },
        }
    }
}

/// A [`CommandPlan`] converted for use in a child process
#[derive(Debug, Clone)]
pub enum ExecPlan {
    Simple(Program),
    Redirect { program: Program, target: CString },
    Pipe { first: Program, second: Program },
}

impl ExecPlan {
    /// Convert a plan. `None` when there is nothing to run.
    pub fn prepare(plan: &CommandPlan) -> Result<Option<Self>> {
        if plan.command().is_empty() {
            return Ok(None);
        }
        let exec = match plan {
            CommandPlan::Simple(args) => ExecPlan::Simple(Program::new(args)?),
            CommandPlan::Redirect { command, target } => ExecPlan::Redirect {
                program: Program::new(command)?,
                target: CString::new(target.as_str())
                    .map_err(|_| ShellError::InvalidArgument(target.clone()))?,
            },
            CommandPlan::Pipe { first, second } => ExecPlan::Pipe {
                first: Program::new(first)?,
                second: Program::new(second)?,
            },
        };
        Ok(Some(exec))
    }
}

/// What [`launch`] did
#[derive(Debug)]
pub enum Launched {
    /// Empty command line, nothing was forked
    Skipped,
    /// Ran in the foreground and finished with this status
    Foreground(ChildStatus),
    /// Registered as a background job
    Background(Job),
}

/// Run a planned command line.
///
/// Foreground commands are waited on with the foreground slot set; background
/// commands are registered and the call returns immediately.
pub fn launch(
    ctx: &ShellContext,
    plan: &CommandPlan,
    background: bool,
    command: &str,
) -> Result<Launched> {
    let Some(exec) = ExecPlan::prepare(plan)? else {
        return Ok(Launched::Skipped);
    };

    if background {
        let job = ctx
            .jobs
            .spawn_with(command, || spawn(&exec, Placement::Background))?;
        Ok(Launched::Background(job))
    } else {
        let pid = spawn(&exec, Placement::Foreground)?;
        let status = wait_foreground(ctx, pid)?;
        Ok(Launched::Foreground(status))
    }
}

/// Fork a child that runs `plan`. Returns the child's pid in the parent.
pub fn spawn(plan: &ExecPlan, placement: Placement) -> Result<Pid> {
    // Anything still buffered would be flushed by both processes
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!("spawned pid {} ({:?})", child, placement);
            Ok(child)
        }
        Ok(ForkResult::Child) => run_child(plan, placement),
        Err(errno) => Err(ShellError::ChildCreation(errno)),
    }
}

/// Wait for `pid` with it published as the foreground process
pub fn wait_foreground(ctx: &ShellContext, pid: Pid) -> Result<ChildStatus> {
    let _foreground = ctx.foreground.hold(pid);
    wait_for(pid)
}

/// Block until `pid` terminates.
///
/// There is no job suspension, so a child that gets stopped is resumed
/// straight away. A termination request sent while it was stopped is then
/// delivered instead of staying pending forever.
pub fn wait_for(pid: Pid) -> Result<ChildStatus> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ChildStatus::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(ChildStatus::Signaled(sig)),
            Ok(WaitStatus::Stopped(_, sig)) => {
                debug!("pid {} stopped by {}, resuming", pid, sig);
                if let Err(errno) = kill(pid, Signal::SIGCONT) {
                    debug!("could not resume pid {}: {}", pid, errno);
                }
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(errno) => {
                return Err(ShellError::Wait {
                    pid: pid.as_raw(),
                    errno,
                })
            }
        }
    }
}

/// Child side of [`spawn`]. Other threads may have held locks at fork time,
/// so nothing here may take a lock: no logging, no `std::io` handles.
fn run_child(plan: &ExecPlan, placement: Placement) -> ! {
    // Background jobs stay in the shell's process group, so they can still
    // use the terminal after `fg`, but ignore the terminal's Ctrl+C. SIGTSTP
    // stays ignored as inherited.
    let sigint = match placement {
        Placement::Foreground => SigHandler::SigDfl,
        Placement::Background => SigHandler::SigIgn,
    };
    unsafe {
        let _ = signal(Signal::SIGINT, sigint);
    }

    let err = match plan {
        ExecPlan::Simple(program) => program.exec(),
        ExecPlan::Redirect { program, target } => match redirect_stdout(target) {
            Ok(()) => program.exec(),
            Err(err) => err,
        },
        ExecPlan::Pipe { first, second } => run_pipe(first, second),
    };

    write_stderr(&format!("jobsh: {}\n", err));
    let status = match err {
        ShellError::ExecFailure { .. } => EXEC_FAILURE_STATUS,
        _ => SETUP_FAILURE_STATUS,
    };
    unsafe { libc::_exit(status) }
}

/// Unbuffered write to fd 2
fn write_stderr(message: &str) {
    let bytes = message.as_bytes();
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

fn redirect_stdout(target: &CString) -> Result<()> {
    let redirect_error = |errno: Errno| ShellError::Redirect {
        path: PathBuf::from(target.to_string_lossy().into_owned()),
        source: io::Error::from(errno),
    };

    let fd = open(
        target.as_c_str(),
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        Mode::S_IRWXU,
    )
    .map_err(redirect_error)?;
    move_fd(fd, libc::STDOUT_FILENO).map_err(redirect_error)
}

/// Make `to` refer to `from` and close the original
fn move_fd(from: RawFd, to: RawFd) -> std::result::Result<(), Errno> {
    if from != to {
        dup2(from, to)?;
        close(from)?;
    }
    Ok(())
}

/// Run `first | second`. The current process becomes `second`; `first` runs
/// in a fresh child. Only returns on failure.
fn run_pipe(first: &Program, second: &Program) -> ShellError {
    let (read_end, write_end) = match pipe() {
        Ok(ends) => ends,
        Err(errno) => return ShellError::Io(errno.into()),
    };

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            if let Err(errno) = dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO) {
                return ShellError::Io(errno.into());
            }
            drop(read_end);
            drop(write_end);
            first.exec()
        }
        Ok(ForkResult::Parent { .. }) => {
            if let Err(errno) = dup2(read_end.as_raw_fd(), libc::STDIN_FILENO) {
                return ShellError::Io(errno.into());
            }
            drop(read_end);
            drop(write_end);
            second.exec()
        }
        Err(errno) => ShellError::ChildCreation(errno),
    }
}
