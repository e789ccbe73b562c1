//! Signal handling for jobsh
//!
//! Provides the asynchronous half of job control:
//! - SIGINT (Ctrl+C): terminate the foreground process, never the shell
//! - SIGCHLD: reap finished background jobs
//! - SIGTSTP (Ctrl+Z): ignored

use crate::context::ShellContext;
use crate::jobs::{ChildStatus, JobRegistry};
use log::{debug, trace, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use signal_hook::consts::{SIGCHLD, SIGINT};
use signal_hook::iterator::{Handle, Signals};
use signal_hook::{low_level, SigId};
use std::io;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const NO_FOREGROUND: i32 = -1;

/// PID of the process the shell is blocked on, or none.
///
/// Read from signal context, so it is a bare atomic.
#[derive(Debug)]
pub struct ForegroundSlot {
    pid: AtomicI32,
}

impl Default for ForegroundSlot {
    fn default() -> Self {
        ForegroundSlot {
            pid: AtomicI32::new(NO_FOREGROUND),
        }
    }
}

impl ForegroundSlot {
    /// Set the foreground process PID
    pub fn set(&self, pid: Pid) {
        self.pid.store(pid.as_raw(), Ordering::SeqCst);
    }

    /// Clear the foreground process PID
    pub fn clear(&self) {
        self.pid.store(NO_FOREGROUND, Ordering::SeqCst);
    }

    /// Get the current foreground process PID (or None if idle)
    pub fn get(&self) -> Option<Pid> {
        let pid = self.pid.load(Ordering::SeqCst);
        if pid > 0 {
            Some(Pid::from_raw(pid))
        } else {
            None
        }
    }

    /// Mark `pid` as foreground until the returned guard is dropped
    pub fn hold(&self, pid: Pid) -> ForegroundGuard<'_> {
        debug!("foreground: pid {}", pid);
        self.set(pid);
        ForegroundGuard { slot: self }
    }

    /// Send a termination request to the foreground process, if there is one.
    ///
    /// Async-signal-safe: one atomic load and one kill(2).
    pub fn interrupt(&self) -> bool {
        match self.get() {
            Some(pid) => kill(pid, Signal::SIGTERM).is_ok(),
            None => false,
        }
    }
}

/// Clears the foreground slot on drop, whatever the wait returned
pub struct ForegroundGuard<'a> {
    slot: &'a ForegroundSlot,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.slot.clear();
        debug!("foreground: idle");
    }
}

/// Send SIGTERM to a process
pub fn terminate_process(pid: Pid) -> Result<(), Errno> {
    kill(pid, Signal::SIGTERM)
}

/// Non-blocking check on one child. `None` while it is still running.
pub fn probe(pid: Pid) -> Option<ChildStatus> {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(_, code)) => Some(ChildStatus::Exited(code)),
        Ok(WaitStatus::Signaled(_, sig, _)) => Some(ChildStatus::Signaled(sig)),
        Ok(_) => None,
        Err(Errno::EINTR) => None,
        Err(errno) => {
            warn!("waitpid({}) failed: {}", pid, errno);
            Some(ChildStatus::Lost)
        }
    }
}

/// Collect every registered background job that has finished.
///
/// Only registered pids are waited on, so a foreground child is never
/// stolen from the wait that owns it.
pub fn reap_jobs(jobs: &JobRegistry) -> usize {
    let reaped = jobs.lock().sweep(|job| probe(job.pid));
    trace!("reap pass collected {} job(s)", reaped);
    reaped
}

/// Installed signal handlers. Dropping it restores the previous SIGINT
/// behaviour and stops the reaper thread.
pub struct SignalLayer {
    sigint: SigId,
    handle: Handle,
    reaper: Option<JoinHandle<()>>,
}

impl SignalLayer {
    /// Set up signal handlers for the shell
    pub fn install(ctx: Arc<ShellContext>) -> io::Result<SignalLayer> {
        unsafe { signal(Signal::SIGTSTP, SigHandler::SigIgn) }.map_err(io::Error::from)?;

        let mut signals = Signals::new([SIGCHLD])?;
        let handle = signals.handle();

        let fg = Arc::clone(&ctx);
        let reaper = thread::Builder::new()
            .name("jobsh-reaper".into())
            .spawn(move || {
                for _ in signals.forever() {
                    reap_jobs(&ctx.jobs);
                }
                trace!("reaper stopped");
            })?;

        let sigint = unsafe {
            low_level::register(SIGINT, move || {
                fg.foreground.interrupt();
            })
        };
        let sigint = match sigint {
            Ok(id) => id,
            Err(e) => {
                handle.close();
                let _ = reaper.join();
                return Err(e);
            }
        };

        Ok(SignalLayer {
            sigint,
            handle,
            reaper: Some(reaper),
        })
    }
}

impl Drop for SignalLayer {
    fn drop(&mut self) {
        low_level::unregister(self.sigint);
        self.handle.close();
        if let Some(reaper) = self.reaper.take() {
            let _ = reaper.join();
        }
    }
}
