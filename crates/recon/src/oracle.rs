//! Yes/no decisions from outside the engine.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::ReconError;

/// Answers a yes/no question. `Err(ReconError::Cancelled)` stops the run.
pub trait Oracle {
    fn ask(&mut self, question: &str) -> Result<bool, ReconError>;
}

/// What a line of operator input means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Yes,
    No,
    Quit,
    Unrecognized,
}

pub fn parse_reply(input: &str) -> Reply {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Reply::Yes,
        "n" | "no" => Reply::No,
        "q" | "quit" => Reply::Quit,
        _ => Reply::Unrecognized,
    }
}

/// Line-oriented prompt. Re-asks until it gets y/n/q; end of input cancels.
pub struct PromptOracle<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptOracle<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn write_prompt(&mut self, text: &str) -> Result<(), ReconError> {
        write!(self.output, "{text}")
            .and_then(|()| self.output.flush())
            .map_err(|e| ReconError::Io(format!("cannot write prompt: {e}")))
    }
}

impl<R: BufRead, W: Write> Oracle for PromptOracle<R, W> {
    fn ask(&mut self, question: &str) -> Result<bool, ReconError> {
        loop {
            self.write_prompt(&format!("{question} (y/n/q): "))?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| ReconError::Io(format!("cannot read answer: {e}")))?;
            if read == 0 {
                log::info!("prompt input closed; treating as quit");
                return Err(ReconError::Cancelled);
            }

            match parse_reply(&line) {
                Reply::Yes => return Ok(true),
                Reply::No => return Ok(false),
                Reply::Quit => return Err(ReconError::Cancelled),
                Reply::Unrecognized => {
                    self.write_prompt("Invalid response. Please answer with 'y', 'n', 'q' or 'quit'.\n")?;
                }
            }
        }
    }
}

/// Replays canned answers in order. Running out of answers cancels.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    answers: VecDeque<Reply>,
    questions: Vec<String>,
}

impl ScriptedOracle {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self::with_replies(answers.into_iter().map(|yes| if yes { Reply::Yes } else { Reply::No }))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            answers: replies.into_iter().collect(),
            questions: Vec::new(),
        }
    }

    /// Questions asked so far, re-asks included.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn prompt_count(&self) -> usize {
        self.questions.len()
    }
}

impl Oracle for ScriptedOracle {
    fn ask(&mut self, question: &str) -> Result<bool, ReconError> {
        loop {
            self.questions.push(question.to_string());
            match self.answers.pop_front() {
                Some(Reply::Yes) => return Ok(true),
                Some(Reply::No) => return Ok(false),
                Some(Reply::Quit) | None => return Err(ReconError::Cancelled),
                Some(Reply::Unrecognized) => continue,
            }
        }
    }
}
