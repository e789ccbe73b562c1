//! Tokenization for jobsh
//!
//! A command line is split into an argument vector plus a background flag.
//! There is no quoting: tokens are maximal runs of printable characters.

use log::trace;

/// Characters that separate tokens
const DELIMITERS: [char; 3] = [' ', '\t', '\n'];

/// Marker that sends a command to the background
const BACKGROUND: char = '&';

/// One tokenized input line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    /// The argument vector; `args[0]` is the command name
    pub args: Vec<String>,
    /// Set when the line contained an `&`
    pub background: bool,
}

impl CommandLine {
    /// Number of arguments
    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The command name, if any
    pub fn command(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Arguments rejoined with single spaces, used for job notices
    pub fn text(&self) -> String {
        self.args.join(" ")
    }
}

/// Tokenize one raw input line.
///
/// Only the first `&` is significant: it is replaced by whitespace and marks
/// the line as a background command. Any character with a value of 32 or less
/// ends the token it appears in.
pub fn tokenize(line: &str) -> CommandLine {
    let (line, background) = match line.find(BACKGROUND) {
        Some(pos) => {
            let mut owned = line.to_string();
            owned.replace_range(pos..pos + BACKGROUND.len_utf8(), " ");
            (owned, true)
        }
        None => (line.to_string(), false),
    };

    let args: Vec<String> = line
        .split(&DELIMITERS[..])
        .map(trim_control)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    trace!("tokenized {:?} (background: {})", args, background);
    CommandLine { args, background }
}

/// Cut a token at its first control or space character
fn trim_control(token: &str) -> &str {
    match token.find(|c: char| (c as u32) <= 32) {
        Some(end) => &token[..end],
        None => token,
    }
}
