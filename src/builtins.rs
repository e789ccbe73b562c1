//! Built-in commands: echo, cd, pwd, exit, fg, jobs

use crate::error::{Result, ShellError};
use crate::jobs::JobId;
use crate::launcher;
use crate::planner::CommandPlan;
use crate::shell::{Flow, Shell};
use crate::signals;
use log::debug;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// Names handled inside the shell process
pub const BUILTINS: [&str; 6] = ["echo", "cd", "pwd", "exit", "fg", "jobs"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Create or truncate a redirection target, owner rwx
pub(crate) fn open_redirect(target: &str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o700)
        .open(target)
        .map_err(|source| ShellError::Redirect {
            path: PathBuf::from(target),
            source,
        })
}

impl Shell {
    /// Run the plan's command if it names a built-in.
    ///
    /// Returns `None` when the command has to be launched as a program. With a
    /// redirect plan the built-in writes into the target file; the shell's own
    /// stdout is left alone.
    pub(crate) fn try_builtin(
        &mut self,
        plan: &CommandPlan,
        out: &mut dyn Write,
    ) -> Option<Result<Flow>> {
        let args = plan.command();
        let name = args.first()?;
        if !is_builtin(name) {
            return None;
        }
        debug!("builtin: {}", name);

        let result = match plan {
            CommandPlan::Redirect { target, .. } => {
                open_redirect(target).and_then(|mut file| self.run_builtin(args, &mut file))
            }
            _ => self.run_builtin(args, out),
        };
        Some(result)
    }

    fn run_builtin(&mut self, args: &[String], out: &mut dyn Write) -> Result<Flow> {
        let rest = &args[1..];
        match args[0].as_str() {
            "echo" => self.builtin_echo(rest, out)?,
            "cd" => self.builtin_cd(rest, out)?,
            "pwd" => self.builtin_pwd(out)?,
            "fg" => self.builtin_fg(rest)?,
            "jobs" => self.builtin_jobs(out)?,
            "exit" => return Ok(self.builtin_exit(rest)),
            other => unreachable!("not a builtin: {}", other),
        }
        Ok(Flow::Continue)
    }

    pub(crate) fn builtin_echo(&mut self, args: &[String], out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", args.join(" "))?;
        self.last_status = 0;
        Ok(())
    }

    pub(crate) fn builtin_pwd(&mut self, out: &mut dyn Write) -> Result<()> {
        let cwd = env::current_dir().map_err(ShellError::WorkingDirectoryUnavailable)?;
        writeln!(out, "{}", cwd.display())?;
        self.last_status = 0;
        Ok(())
    }

    /// `cd` without a path prints the working directory
    pub(crate) fn builtin_cd(&mut self, args: &[String], out: &mut dyn Write) -> Result<()> {
        let Some(path) = args.first() else {
            return self.builtin_pwd(out);
        };

        env::set_current_dir(path).map_err(|source| ShellError::DirectoryChange {
            path: PathBuf::from(path),
            source,
        })?;
        self.last_status = 0;
        Ok(())
    }

    pub(crate) fn builtin_jobs(&mut self, out: &mut dyn Write) -> Result<()> {
        for job in self.ctx.jobs.snapshot() {
            writeln!(out, "[{}] {}", job.id, job.pid)?;
        }
        self.last_status = 0;
        Ok(())
    }

    /// Wait in the foreground for a background job.
    ///
    /// The job leaves the registry before the wait starts, so the reaper
    /// cannot collect it out from under us.
    pub(crate) fn builtin_fg(&mut self, args: &[String]) -> Result<()> {
        let jobspec = args.first().map(String::as_str).unwrap_or("current");
        let job_id: JobId = jobspec
            .trim_start_matches('%')
            .parse()
            .map_err(|_| ShellError::JobNotFound(jobspec.to_string()))?;

        let job = self
            .ctx
            .jobs
            .take(job_id)
            .ok_or_else(|| ShellError::JobNotFound(jobspec.to_string()))?;

        eprintln!("{}", job.command);
        let status = launcher::wait_foreground(&self.ctx, job.pid)?;
        self.last_status = status.code();
        Ok(())
    }

    /// Forget (or, if configured, terminate) every background job and
    /// request the loop to stop
    pub(crate) fn builtin_exit(&mut self, args: &[String]) -> Flow {
        let code = args.first().and_then(|s| s.parse::<i32>().ok()).unwrap_or(0);

        for job in self.ctx.jobs.clear() {
            if self.config.exit_kills_jobs {
                if let Err(errno) = signals::terminate_process(job.pid) {
                    debug!("could not terminate job [{}]: {}", job.id, errno);
                }
            } else {
                debug!("leaving job [{}] pid {} running", job.id, job.pid);
            }
        }
        Flow::Exit(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use nix::unistd::Pid;

    fn shell() -> Shell {
        Shell::without_signals(Config::default())
    }

    fn run(sh: &mut Shell, line: &str) -> (Result<Flow>, String) {
        let mut out = Vec::new();
        let flow = sh.execute_line(line, &mut out);
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn builtin_names() {
        assert!(is_builtin("echo"));
        assert!(is_builtin("jobs"));
        assert!(!is_builtin("Echo"));
        assert!(!is_builtin("ls"));
    }

    #[test]
    fn echo_joins_with_single_spaces() {
        let mut sh = shell();
        let (flow, out) = run(&mut sh, "echo a b c\n");
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert_eq!(out, "a b c\n");
    }

    #[test]
    fn echo_without_arguments_prints_newline() {
        let mut sh = shell();
        assert_eq!(run(&mut sh, "echo").1, "\n");
    }

    #[test]
    fn pwd_prints_current_dir() {
        let mut sh = shell();
        let expected = format!("{}\n", env::current_dir().unwrap().display());
        assert_eq!(run(&mut sh, "pwd").1, expected);
    }

    #[test]
    fn bare_cd_matches_pwd() {
        let mut sh = shell();
        assert_eq!(run(&mut sh, "cd").1, run(&mut sh, "pwd").1);
    }

    #[test]
    fn cd_to_missing_dir_fails_without_moving() {
        let mut sh = shell();
        let before = env::current_dir().unwrap();
        let (flow, _) = run(&mut sh, "cd /jobsh/definitely/not/here");
        match flow {
            Err(ShellError::DirectoryChange { path, .. }) => {
                assert_eq!(path, PathBuf::from("/jobsh/definitely/not/here"))
            }
            other => panic!("expected DirectoryChange, got {:?}", other),
        }
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn jobs_lists_in_launch_order() {
        let mut sh = shell();
        {
            let mut table = sh.ctx.jobs.lock();
            table.insert(Pid::from_raw(501), "a");
            table.insert(Pid::from_raw(502), "b");
            table.insert(Pid::from_raw(503), "c");
            table.remove(2);
        }
        assert_eq!(run(&mut sh, "jobs").1, "[1] 501\n[3] 503\n");
    }

    #[test]
    fn fg_without_id_is_no_such_job() {
        let mut sh = shell();
        let (flow, _) = run(&mut sh, "fg");
        assert!(matches!(flow, Err(ShellError::JobNotFound(ref s)) if s == "current"));
    }

    #[test]
    fn fg_with_bad_id_is_no_such_job() {
        let mut sh = shell();
        assert!(matches!(run(&mut sh, "fg abc").0, Err(ShellError::JobNotFound(_))));
        assert!(matches!(run(&mut sh, "fg 12").0, Err(ShellError::JobNotFound(_))));
    }

    #[test]
    fn fg_waits_and_removes_job() {
        let mut sh = shell();
        run(&mut sh, "sleep 0.1 &").0.unwrap();
        run(&mut sh, "false &").0.unwrap();
        assert_eq!(sh.ctx.jobs.len(), 2);

        run(&mut sh, "fg 2").0.unwrap();
        assert_eq!(sh.last_status(), 1);

        run(&mut sh, "fg %1").0.unwrap();
        assert_eq!(sh.last_status(), 0);

        assert!(sh.ctx.jobs.is_empty());
        assert_eq!(run(&mut sh, "jobs").1, "");
        assert_eq!(sh.ctx.foreground.get(), None);
    }

    #[test]
    fn exit_forgets_jobs() {
        let mut sh = shell();
        sh.ctx.jobs.lock().insert(Pid::from_raw(777_777), "ghost");
        let (flow, _) = run(&mut sh, "exit");
        assert_eq!(flow.unwrap(), Flow::Exit(0));
        assert!(sh.ctx.jobs.is_empty());
    }

    #[test]
    fn exit_with_code() {
        let mut sh = shell();
        assert_eq!(run(&mut sh, "exit 3").0.unwrap(), Flow::Exit(3));
    }

    #[test]
    fn builtin_output_follows_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let mut sh = shell();

        let (flow, out) = run(&mut sh, &format!("echo hi > {}", target.display()));
        flow.unwrap();
        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hi\n");

        // Truncates on the next write
        run(&mut sh, &format!("echo bye > {}", target.display())).0.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "bye\n");

        // And stdout is back to normal
        assert_eq!(run(&mut sh, "echo after").1, "after\n");
    }
}
