// Console boundary: one trait for reading lines (plain or masked) and
// printing, so workflows can be driven by a scripted console in tests.
// An interrupted or exhausted input stream surfaces as a normal error
// value that callers propagate with `?` instead of catching.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use dialoguer::Password;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The input stream was interrupted or closed. This is the user's
    /// always-available hard escape: it propagates out of every prompt
    /// loop and terminates the enclosing workflow.
    #[error("input interrupted")]
    Interrupted,
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub trait Console {
    /// Prompt and read one line, trimmed of surrounding whitespace.
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError>;
    /// Prompt and read one line with the echo masked (passwords).
    fn read_secret(&mut self, prompt: &str) -> Result<String, ConsoleError>;
    /// Write one line of output.
    fn print(&mut self, text: &str);
}

/// Real terminal console over stdin/stdout. Masked input goes through
/// `dialoguer::Password`, which adds its own ": " after the prompt.
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        let mut out = io::stdout();
        out.write_all(prompt.as_bytes())?;
        out.flush()?;
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            // EOF (Ctrl-D): treat like an interrupt.
            return Err(ConsoleError::Interrupted);
        }
        Ok(line.trim().to_string())
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        let value = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::Interrupted || e.kind() == io::ErrorKind::UnexpectedEof {
                    ConsoleError::Interrupted
                } else {
                    ConsoleError::Io(e)
                }
            })?;
        Ok(value.trim().to_string())
    }

    fn print(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Canned console for tests: serves a fixed input script and records
/// everything printed. Once the script runs out, reads fail with
/// `Interrupted`, which drives open-ended prompt loops to termination
/// the same way a user abort would.
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    pub output: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: Vec::new(),
        }
    }

    /// Number of printed lines containing `needle`.
    pub fn printed(&self, needle: &str) -> usize {
        self.output.iter().filter(|l| l.contains(needle)).count()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, _prompt: &str) -> Result<String, ConsoleError> {
        self.inputs
            .pop_front()
            .map(|s| s.trim().to_string())
            .ok_or(ConsoleError::Interrupted)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.read_line(prompt)
    }

    fn print(&mut self, text: &str) {
        self.output.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_console_serves_inputs_in_order() {
        let mut console = ScriptedConsole::new(["  first  ", "second"]);
        assert_eq!(console.read_line("? ").unwrap(), "first");
        assert_eq!(console.read_secret("? ").unwrap(), "second");
    }

    #[test]
    fn scripted_console_interrupts_when_exhausted() {
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        assert!(matches!(
            console.read_line("? "),
            Err(ConsoleError::Interrupted)
        ));
    }

    #[test]
    fn scripted_console_counts_printed_lines() {
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        console.print("one banana");
        console.print("two banana");
        console.print("other");
        assert_eq!(console.printed("banana"), 2);
    }
}
