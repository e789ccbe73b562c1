use jobsh::{LineSource, Result, ShellError};
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Terminal line source backed by rustyline
pub(crate) struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub(crate) fn new() -> rustyline::Result<Self> {
        Ok(EditorSource {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(line)
            }
            // Ctrl-C at the prompt: drop the line, prompt again
            Err(ReadlineError::Interrupted) => Ok(String::new()),
            Err(ReadlineError::Eof) => Err(ShellError::InputClosed),
            Err(err) => {
                debug!("readline failed: {:?}", err);
                Err(ShellError::InputClosed)
            }
        }
    }
}
