//! Background job registry
//!
//! The registry is shared between the read loop and the reaper thread, so
//! every mutation and every traversal happens under one mutex. Jobs are keyed
//! by id in a `BTreeMap`; ids only ever grow, so key order is launch order.

use log::debug;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Job numbers start at 1 and are never reused within a run
pub type JobId = u32;

/// A background child tracked by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub pid: Pid,
    /// Command text, for notices
    pub command: String,
}

/// How a child finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    Exited(i32),
    Signaled(Signal),
    /// The child was collected elsewhere and its status is unknown
    Lost,
}

impl ChildStatus {
    /// Shell-style numeric status: the exit code, or 128 + signal number
    pub fn code(&self) -> i32 {
        match self {
            ChildStatus::Exited(code) => *code,
            ChildStatus::Signaled(sig) => 128 + *sig as i32,
            ChildStatus::Lost => 1,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ChildStatus::Exited(0))
    }
}

impl fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildStatus::Exited(0) => write!(f, "Done"),
            ChildStatus::Exited(code) => write!(f, "Exit {}", code),
            ChildStatus::Signaled(sig) => write!(f, "Killed ({})", sig),
            ChildStatus::Lost => write!(f, "Lost"),
        }
    }
}

/// A background job that finished while nobody was waiting on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub job: Job,
    pub status: ChildStatus,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.job.id, self.status, self.job.command)
    }
}

/// The unguarded table. Only reachable through [`JobRegistry::lock`].
#[derive(Debug)]
pub struct JobTable {
    next_id: JobId,
    jobs: BTreeMap<JobId, Job>,
    finished: Vec<Completion>,
}

impl Default for JobTable {
    fn default() -> Self {
        JobTable {
            next_id: 1,
            jobs: BTreeMap::new(),
            finished: Vec::new(),
        }
    }
}

impl JobTable {
    /// Register a new job under the next id
    pub fn insert(&mut self, pid: Pid, command: impl Into<String>) -> Job {
        // A pid can only be live once; a stale entry means its exit was missed
        self.jobs.retain(|_, job| job.pid != pid);

        let job = Job {
            id: self.next_id,
            pid,
            command: command.into(),
        };
        self.next_id += 1;
        self.jobs.insert(job.id, job.clone());
        debug!("registered job [{}] pid {}", job.id, job.pid);
        job
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id)
    }

    pub fn remove_pid(&mut self, pid: Pid) -> Option<Job> {
        let id = self.jobs.values().find(|job| job.pid == pid)?.id;
        self.jobs.remove(&id)
    }

    /// Drop every job, returning them in launch order
    pub fn clear(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs in launch order
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Remove every job for which `probe` reports a final status, recording
    /// each one as a completion. Returns how many jobs were removed.
    pub fn sweep<F>(&mut self, mut probe: F) -> usize
    where
        F: FnMut(&Job) -> Option<ChildStatus>,
    {
        let done: Vec<(JobId, ChildStatus)> = self
            .jobs
            .values()
            .filter_map(|job| probe(job).map(|status| (job.id, status)))
            .collect();

        for (id, status) in &done {
            if let Some(job) = self.jobs.remove(id) {
                debug!("job [{}] pid {} finished: {}", job.id, job.pid, status);
                self.finished.push(Completion { job, status: *status });
            }
        }
        done.len()
    }

    /// Take the completions recorded since the last call
    pub fn drain_finished(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.finished)
    }
}

/// Lock-protected job table shared between the read loop and the reaper
#[derive(Debug, Default)]
pub struct JobRegistry {
    table: Mutex<JobTable>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the table. A panic while holding the lock cannot leave the table
    /// half-updated, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, JobTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a child with `spawn` and register it, holding the lock across
    /// both steps so the reaper never sees a child before it is registered.
    pub fn spawn_with<F, E>(&self, command: impl Into<String>, spawn: F) -> Result<Job, E>
    where
        F: FnOnce() -> Result<Pid, E>,
    {
        let mut table = self.lock();
        let pid = spawn()?;
        Ok(table.insert(pid, command))
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    /// Remove a job so the caller can wait on it directly
    pub fn take(&self, id: JobId) -> Option<Job> {
        self.lock().remove(id)
    }

    pub fn remove_pid(&self, pid: Pid) -> Option<Job> {
        self.lock().remove_pid(pid)
    }

    pub fn clear(&self) -> Vec<Job> {
        self.lock().clear()
    }

    /// Consistent copy of the registered jobs, in launch order
    pub fn snapshot(&self) -> Vec<Job> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn drain_finished(&self) -> Vec<Completion> {
        self.lock().drain_finished()
    }
}
