//! The read-dispatch-launch loop

use crate::config::Config;
use crate::context::ShellContext;
use crate::error::{Result, ShellError};
use crate::input::LineSource;
use crate::launcher::{self, Launched};
use crate::lexer::tokenize;
use crate::planner;
use crate::signals::{self, SignalLayer};
use log::{debug, info};
use std::io::{self, Write};
use std::sync::Arc;

/// What the loop does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// An interactive shell: configuration, shared job state and the signal
/// handlers that keep it current.
pub struct Shell {
    pub(crate) ctx: Arc<ShellContext>,
    pub(crate) config: Config,
    /// Status of the last command
    pub(crate) last_status: i32,
    signals: Option<SignalLayer>,
}

impl Shell {
    /// Create a shell and install its signal handlers
    pub fn new(config: Config) -> Result<Self> {
        let ctx = ShellContext::new();
        let signals = SignalLayer::install(Arc::clone(&ctx)).map_err(ShellError::Signals)?;
        Ok(Shell {
            ctx,
            config,
            last_status: 0,
            signals: Some(signals),
        })
    }

    /// Create a shell without signal handlers. Finished background jobs are
    /// then only collected before each prompt.
    pub fn without_signals(config: Config) -> Self {
        Shell {
            ctx: ShellContext::new(),
            config,
            last_status: 0,
            signals: None,
        }
    }

    pub fn context(&self) -> &Arc<ShellContext> {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub fn has_signal_handlers(&self) -> bool {
        self.signals.is_some()
    }

    /// Read and execute lines until `exit` or until input closes.
    ///
    /// Returns the exit code requested by `exit`. Closed input is the only
    /// error that escapes.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<i32> {
        info!("shell started, pid {}", std::process::id());
        loop {
            self.report_finished(&mut io::stdout());

            let line = source.read_line(&self.config.prompt)?;
            match self.execute_line(&line, &mut io::stdout()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return Ok(code),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => self.report(&err),
            }
        }
    }

    /// Execute one raw input line. Built-in output goes to `out`.
    pub fn execute_line(&mut self, input: &str, out: &mut dyn Write) -> Result<Flow> {
        let line = tokenize(input);
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let plan = planner::plan(&line.args)?;
        if !plan.is_pipe() {
            if let Some(result) = self.try_builtin(&plan, out) {
                return result;
            }
        }

        match launcher::launch(&self.ctx, &plan, line.background, &line.text())? {
            Launched::Skipped => {}
            Launched::Foreground(status) => {
                debug!("foreground command finished: {}", status);
                self.last_status = status.code();
            }
            Launched::Background(job) => {
                eprintln!("[{}] {}", job.id, job.pid);
                self.last_status = 0;
            }
        }
        Ok(Flow::Continue)
    }

    /// Collect finished background jobs and announce them
    pub fn report_finished(&self, out: &mut dyn Write) {
        signals::reap_jobs(&self.ctx.jobs);
        for completion in self.ctx.jobs.drain_finished() {
            let _ = writeln!(out, "{}", completion);
        }
    }

    /// Print a recoverable error and record the failure
    pub fn report(&mut self, err: &ShellError) {
        eprintln!("jobsh: {}", err);
        self.last_status = 1;
    }
}
