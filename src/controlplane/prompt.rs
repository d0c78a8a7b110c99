//! Console Prompts
//!
//! Numbered-choice and yes/no questions on a terminal. Invalid answers are
//! reported and the question is asked again; end of input is an error.

use crate::domain::ports::Prompter;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

const INVALID_INPUT: &str = "Invalid input.";

/// Prompts over an async reader/writer pair
pub struct ConsolePrompter<R, W> {
    reader: R,
    writer: W,
}

impl ConsolePrompter<BufReader<Stdin>, Stdout> {
    /// Prompt on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsolePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next answer without its line terminator
    async fn read_answer(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(Error::Input("input closed before an answer was given".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Map a 1-based answer onto a choice index
fn parse_choice(answer: &str, choices: usize) -> Option<usize> {
    let n: usize = answer.trim().parse().ok()?;
    (1..=choices).contains(&n).then(|| n - 1)
}

#[async_trait]
impl<R, W> Prompter for ConsolePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn select(&mut self, question: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            return Err(Error::Input(format!("nothing to choose for: {}", question)));
        }

        let mut menu = format!("{}\n", question);
        for (i, choice) in choices.iter().enumerate() {
            menu.push_str(&format!(" {}. {}\n", i + 1, choice));
        }
        self.write(&menu).await?;

        loop {
            self.write(">>> ").await?;
            let answer = self.read_answer().await?;
            match parse_choice(&answer, choices.len()) {
                Some(index) => return Ok(index),
                None => self.write(&format!("{}\n", INVALID_INPUT)).await?,
            }
        }
    }

    async fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            self.write(&format!("{} [y|n] ", question)).await?;
            match self.read_answer().await?.as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => self.write(&format!("{}\n", INVALID_INPUT)).await?,
            }
        }
    }
}
