use crate::error::{Error, Result};
use crate::secret::{self, Secret};
use std::io::{self, BufRead, Write};

/// Interactive questions the add and scan flows may need answered.
pub trait Prompt {
    /// Asks for a secret. The answer is not validated here.
    fn secret(&mut self) -> Result<Secret>;

    /// Asks for a replacement for `taken`, a name that is already in use.
    fn new_name(&mut self, taken: &str) -> Result<String>;
}

/// Room for a typical answer, so reading a secret rarely grows the buffer.
const LINE_CAPACITY: usize = 256;

/// Prompts on a writer and reads answers a line at a time.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> LinePrompt<R, W> {
        LinePrompt { input, output }
    }

    /// Returns the answer trimmed; the line it was read into is zeroed.
    fn ask(&mut self, question: &str) -> Result<Secret> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::with_capacity(LINE_CAPACITY);
        let read = self.input.read_line(&mut line);
        let answer = Secret::new(line.trim().to_string());
        secret::zero(&mut line);
        if read? == 0 {
            return Err(Error::Cancelled);
        }
        Ok(answer)
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        LinePrompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn secret(&mut self) -> Result<Secret> {
        self.ask("Type secret: ")
    }

    /// Blank answers are asked again.
    fn new_name(&mut self, taken: &str) -> Result<String> {
        let question = format!("Name \"{}\" already exists. Type new name: ", taken);
        loop {
            let name = self.ask(&question)?;
            if !name.str().is_empty() {
                return Ok(name.str().to_string());
            }
        }
    }
}

/// Answers from fixed lists, for tests and non-interactive use.
pub struct StaticPrompt {
    secrets: Vec<String>,
    names: Vec<String>,
}

impl StaticPrompt {
    pub fn new(secrets: Vec<String>, names: Vec<String>) -> StaticPrompt {
        StaticPrompt { secrets, names }
    }
}

impl Prompt for StaticPrompt {
    fn secret(&mut self) -> Result<Secret> {
        if self.secrets.is_empty() {
            return Err(Error::Cancelled);
        }
        Ok(Secret::new(self.secrets.remove(0)))
    }

    fn new_name(&mut self, _taken: &str) -> Result<String> {
        if self.names.is_empty() {
            return Err(Error::Cancelled);
        }
        Ok(self.names.remove(0))
    }
}
