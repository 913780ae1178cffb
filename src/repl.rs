use anyhow::Result;
use reedline::{
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline, Signal,
};
use std::borrow::Cow;
use std::io::{BufRead, Write};
use tracing::debug;

use crate::bootstrap::{execute, load_chunk};
use crate::error::ScriptError;
use crate::interpreter::Interpreter;

pub const PROMPT: &str = "> ";

/// Where interactive lines come from; `None` means end of input
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<String>>;
}

/// Plain prompt-and-read over any buffered reader
pub struct PromptedLines<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptedLines<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> LineSource for PromptedLines<R, W> {
    fn next_line(&mut self) -> Result<Option<String>> {
        write!(self.output, "{}", PROMPT)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            self.output.flush()?;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Line editor for terminals
pub struct EditorLines {
    editor: Reedline,
    prompt: ReplPrompt,
}

impl EditorLines {
    pub fn new() -> Self {
        Self {
            editor: Reedline::create(),
            prompt: ReplPrompt,
        }
    }
}

impl Default for EditorLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for EditorLines {
    fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            match self.editor.read_line(&self.prompt)? {
                Signal::Success(line) => return Ok(Some(line)),
                // Ctrl+C drops the current line
                Signal::CtrlC => continue,
                Signal::CtrlD => {
                    println!();
                    return Ok(None);
                }
            }
        }
    }
}

struct ReplPrompt;

impl Prompt for ReplPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(PROMPT)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse search) ", prefix))
    }
}

/// Read-eval-print loop over the session's engine.
///
/// Errors on a line are reported to `errors` and never end the loop.
pub struct Repl<'a, E> {
    interp: &'a Interpreter,
    errors: E,
}

impl<'a, E: Write> Repl<'a, E> {
    pub fn new(interp: &'a Interpreter, errors: E) -> Self {
        Self { interp, errors }
    }

    /// Evaluate lines until the source is exhausted
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<()> {
        debug!("entering interactive mode");
        while let Some(line) = source.next_line()? {
            if line.trim().is_empty() {
                continue;
            }
            if let Err(e) = self.eval(&line) {
                debug!(unit = e.unit(), "interactive line failed");
                writeln!(self.errors, "{}", e.message())?;
                self.errors.flush()?;
            }
        }
        debug!("leaving interactive mode");
        Ok(())
    }

    /// Load and run one line as its own chunk
    pub fn eval(&self, line: &str) -> Result<(), ScriptError> {
        let chunk = load_chunk(self.interp, line.as_bytes(), "=<line>")?;
        execute(self.interp, "<line>", &chunk)
    }
}
