//! Line-oriented console input and output
//!
//! Every retrying prompt is a bounded loop over a parse function, so bad
//! input can never recurse or spin forever.

use std::fmt::Display;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};

use crate::crypto::SecureString;
use crate::error::{VaultError, VaultResult};

/// Invalid answers tolerated before a prompt gives up
pub const MAX_PROMPT_ATTEMPTS: usize = 5;

/// Console the interactive session talks through
pub struct Console {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
    hide_secrets: bool,
}

impl Console {
    /// Standard input and output; secrets are read without echo on a terminal
    pub fn stdio() -> Self {
        let hide_secrets = io::stdin().is_terminal();
        Self {
            input: Box::new(BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
            hide_secrets,
        }
    }

    /// Console over arbitrary streams; secrets are read as plain lines
    pub fn from_streams(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
    ) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            hide_secrets: false,
        }
    }

    /// Print a line
    pub fn say(&mut self, message: impl Display) -> VaultResult<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    /// Print text as-is
    pub fn print(&mut self, text: &str) -> VaultResult<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    /// Ring the terminal bell
    pub fn bell(&mut self) -> VaultResult<()> {
        self.print("\x07")
    }

    /// Prompt and read one trimmed line
    pub fn ask(&mut self, prompt: &str) -> VaultResult<String> {
        self.print(prompt)?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(VaultError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Prompt for a secret, without echo when attached to a terminal
    pub fn ask_secret(&mut self, prompt: &str) -> VaultResult<SecureString> {
        if !self.hide_secrets {
            return self.ask(prompt).map(SecureString::new);
        }

        self.output.flush()?;
        let secret = rpassword::prompt_password(prompt)
            .map_err(|e| VaultError::Io(format!("Failed to read passphrase: {}", e)))?;
        Ok(SecureString::new(secret.trim().to_string()))
    }

    /// Ask until `parse` accepts the answer, at most [`MAX_PROMPT_ATTEMPTS`] times
    pub fn ask_until<T>(
        &mut self,
        prompt: &str,
        mut parse: impl FnMut(&str) -> Result<T, String>,
    ) -> VaultResult<T> {
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            let answer = self.ask(prompt)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(reason) => self.say(reason)?,
            }
        }
        Err(VaultError::Validation(
            "Too many invalid answers".to_string(),
        ))
    }

    /// Ask for a non-empty line
    pub fn ask_required(&mut self, prompt: &str) -> VaultResult<String> {
        self.ask_until(prompt, |answer| {
            if answer.is_empty() {
                Err("A value is required.".to_string())
            } else {
                Ok(answer.to_string())
            }
        })
    }

    /// Ask for a number in `range`
    pub fn ask_number(
        &mut self,
        prompt: &str,
        range: std::ops::RangeInclusive<usize>,
    ) -> VaultResult<usize> {
        self.ask_until(prompt, |answer| match answer.parse::<usize>() {
            Ok(n) if range.contains(&n) => Ok(n),
            Ok(_) => Err(format!(
                "Enter a number from {} to {}.",
                range.start(),
                range.end()
            )),
            Err(_) => Err("Enter a number.".to_string()),
        })
    }

    /// Yes/no question; anything but `y` or `yes` is no
    pub fn confirm(&mut self, prompt: &str) -> VaultResult<bool> {
        let answer = self.ask(prompt)?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Cursor, Write};
    use std::sync::{Arc, Mutex};

    use super::Console;

    /// Output sink that tests can read back
    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Console fed from `script`, with output captured
    pub fn scripted(script: &str) -> (Console, Captured) {
        let captured = Captured::default();
        let console = Console::from_streams(Cursor::new(script.to_string()), captured.clone());
        (console, captured)
    }
}
