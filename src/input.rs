//! Line sources feeding the read loop

use crate::error::{Result, ShellError};
use std::io::{BufRead, Write};

/// Something that can show a prompt and hand back one line of input.
///
/// End of input and read errors both surface as [`ShellError::InputClosed`].
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Reads lines from any buffered reader, writing the prompt to `out`.
///
/// Used for piped stdin and in tests. The interactive binary uses a
/// line editor instead.
pub struct BufReadSource<R, W> {
    reader: R,
    out: W,
}

impl<R: BufRead, W: Write> BufReadSource<R, W> {
    pub fn new(reader: R, out: W) -> Self {
        BufReadSource { reader, out }
    }
}

impl<R: BufRead, W: Write> LineSource for BufReadSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        let _ = write!(self.out, "{}", prompt);
        let _ = self.out.flush();

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => Err(ShellError::InputClosed),
            Ok(_) => Ok(line),
        }
    }
}
