//! Redirection and pipe planning
//!
//! Scans an argument vector for the control tokens `>` and `|` and turns it
//! into a [`CommandPlan`] describing how the child's stdio gets wired.

use crate::error::{Result, ShellError};

/// Output redirection token
pub const REDIRECT: &str = ">";
/// Pipe token
pub const PIPE: &str = "|";

/// How a command line is to be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPlan {
    /// Run the argument vector as-is
    Simple(Vec<String>),
    /// Run `command` with stdout sent to `target`
    Redirect { command: Vec<String>, target: String },
    /// Run `first` with its stdout connected to the stdin of `second`
    Pipe { first: Vec<String>, second: Vec<String> },
}

impl CommandPlan {
    /// The argument vector of the command that runs first
    pub fn command(&self) -> &[String] {
        match self {
            CommandPlan::Simple(args) => args,
            CommandPlan::Redirect { command, .. } => command,
            CommandPlan::Pipe { first, .. } => first,
        }
    }

    pub fn is_pipe(&self) -> bool {
        matches!(self, CommandPlan::Pipe { .. })
    }
}

/// Locate the first `symbol` in `args`.
///
/// A control token needs an operand after it, so an occurrence in the last
/// position is reported as not found. One in the first position is found
/// and leaves an empty command, which launches nothing.
pub fn find_control(args: &[String], symbol: &str) -> Option<usize> {
    let count = args.len();
    args.iter()
        .position(|arg| arg == symbol)
        .filter(|&idx| idx + 1 < count)
}

/// Build the plan for an argument vector.
///
/// Redirection and piping are mutually exclusive on one line, and only a
/// single pipe is supported.
pub fn plan(args: &[String]) -> Result<CommandPlan> {
    let redirect = find_control(args, REDIRECT);
    let pipe = find_control(args, PIPE);

    match (redirect, pipe) {
        (Some(_), Some(_)) => Err(ShellError::UnsupportedCombination),
        (Some(idx), None) => Ok(CommandPlan::Redirect {
            command: args[..idx].to_vec(),
            target: args[idx + 1].clone(),
        }),
        (None, Some(idx)) => {
            let second = &args[idx + 1..];
            if second.iter().any(|arg| arg == PIPE) {
                return Err(ShellError::UnsupportedPipeline);
            }
            Ok(CommandPlan::Pipe {
                first: args[..idx].to_vec(),
                second: second.to_vec(),
            })
        }
        (None, None) => Ok(CommandPlan::Simple(args.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn plain_command() {
        let args = argv("ls -la");
        assert_eq!(plan(&args).unwrap(), CommandPlan::Simple(args.clone()));
        assert_eq!(find_control(&args, REDIRECT), None);
    }

    #[test]
    fn redirect_splits_command_and_target() {
        let args = argv("echo hi > out.txt");
        assert_eq!(find_control(&args, REDIRECT), Some(2));
        assert_eq!(
            plan(&args).unwrap(),
            CommandPlan::Redirect {
                command: argv("echo hi"),
                target: "out.txt".into(),
            }
        );
    }

    #[test]
    fn redirect_ignores_trailing_arguments() {
        let args = argv("echo hi > out.txt extra words");
        match plan(&args).unwrap() {
            CommandPlan::Redirect { command, target } => {
                assert_eq!(command, argv("echo hi"));
                assert_eq!(target, "out.txt");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn first_redirect_wins() {
        let args = argv("echo a > one > two");
        assert_eq!(find_control(&args, REDIRECT), Some(2));
    }

    #[test]
    fn trailing_control_token_is_not_found() {
        let args = argv("echo hi >");
        assert_eq!(find_control(&args, REDIRECT), None);
        assert_eq!(plan(&args).unwrap(), CommandPlan::Simple(args.clone()));

        let args = argv("ls |");
        assert_eq!(find_control(&args, PIPE), None);
    }

    #[test]
    fn leading_control_token_leaves_empty_command() {
        let args = argv("> out.txt");
        assert_eq!(find_control(&args, REDIRECT), Some(0));
        let planned = plan(&args).unwrap();
        assert!(planned.command().is_empty());

        let args = argv("| wc -l");
        assert_eq!(find_control(&args, PIPE), Some(0));
        assert!(plan(&args).unwrap().command().is_empty());
    }

    #[test]
    fn first_occurrence_wins_even_when_leading() {
        let args = argv("> a > b");
        assert_eq!(find_control(&args, REDIRECT), Some(0));
        assert_eq!(
            plan(&args).unwrap(),
            CommandPlan::Redirect {
                command: Vec::new(),
                target: "a".into(),
            }
        );
    }

    #[test]
    fn pipe_splits_both_stages() {
        let args = argv("ls -1 | wc -l");
        let plan = plan(&args).unwrap();
        assert!(plan.is_pipe());
        assert_eq!(
            plan,
            CommandPlan::Pipe {
                first: argv("ls -1"),
                second: argv("wc -l"),
            }
        );
        assert_eq!(plan.command(), &argv("ls -1")[..]);
    }

    #[test]
    fn redirect_and_pipe_together_are_rejected() {
        let args = argv("ls | wc -l > count.txt");
        assert!(matches!(plan(&args), Err(ShellError::UnsupportedCombination)));
    }

    #[test]
    fn second_pipe_is_rejected() {
        let args = argv("ls | sort | uniq");
        assert!(matches!(plan(&args), Err(ShellError::UnsupportedPipeline)));
    }

    #[test]
    fn empty_line_plans_to_empty_command() {
        assert_eq!(plan(&[]).unwrap(), CommandPlan::Simple(Vec::new()));
    }
}
