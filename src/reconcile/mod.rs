//! Config-block reconciler
//!
//! A block is a contiguous region of a line-oriented configuration file that
//! starts at a line matching `start` and runs until a line matching `end`
//! (or the end of the file). [`BlockSpec::apply`] replaces that region with
//! the desired body and leaves every other byte of the file alone:
//!
//! ```text
//!   Outside --start--> InBlock --end--> Done --start--> InBlock (no body)
//! ```
//!
//! The body is written when the first start line is met. Later start lines
//! are legacy duplicates and disappear together with their content. A file
//! without the block gets it appended once.
//!
//! [`file::upsert_block`] wraps the transform with locking, backup and an
//! atomic replace.

pub mod file;
pub mod sshd;

use regex::Regex;

use crate::error::{HostprovError, Result};

pub use file::{Outcome, upsert_block, would_change};

/// Desired block and the patterns that delimit it
#[derive(Debug, Clone)]
pub struct BlockSpec {
    start: Regex,
    end: Regex,
    body: Vec<String>,
    /// The last body line is the block's own closing marker
    closed: bool,
}

/// One line of reconciled output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Input line at this index, unchanged
    Kept(usize),
    /// Line of the desired block
    Body(&'a str),
    /// Separator in front of an appended block
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InBlock,
    Done,
}

impl BlockSpec {
    /// Compile the patterns and check that the body is stable under them
    pub fn new(start: &str, end: &str, body: Vec<String>) -> Result<Self> {
        let start = compile(start)?;
        let end = compile(end)?;

        let Some((first, rest)) = body.split_first() else {
            return Err(invalid_block("the block body is empty"));
        };
        if !start.is_match(first) {
            return Err(invalid_block(format!(
                "first body line '{first}' does not match the start pattern"
            )));
        }

        let closed = rest
            .last()
            .is_some_and(|last| end.is_match(last) && !start.is_match(last));
        let inner = if closed { &rest[..rest.len() - 1] } else { rest };
        if let Some(line) = inner
            .iter()
            .find(|line| start.is_match(line) || end.is_match(line))
        {
            return Err(invalid_block(format!(
                "body line '{line}' would be read as a block boundary"
            )));
        }

        Ok(Self {
            start,
            end,
            body,
            closed,
        })
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Rewrite `lines` so that exactly one block with the desired body exists
    ///
    /// Lines are compared without their terminators. Kept lines are returned
    /// by index so the caller can reproduce them byte-for-byte.
    pub fn upsert_lines<'a>(&'a self, lines: &[&str]) -> Vec<Line<'a>> {
        let mut output = Vec::with_capacity(lines.len() + self.body.len() + 1);
        let mut state = State::Outside;
        let mut written = false;

        for (index, &line) in lines.iter().enumerate() {
            match state {
                State::Outside | State::Done => {
                    if self.start.is_match(line) {
                        if !written {
                            output.extend(self.body_lines());
                            written = true;
                        }
                        state = State::InBlock;
                    } else {
                        output.push(Line::Kept(index));
                    }
                }
                State::InBlock => {
                    if self.is_end(line) {
                        state = State::Done;
                        if !self.closed {
                            output.push(Line::Kept(index));
                        }
                    }
                }
            }
        }

        if !written {
            if lines.last().is_some_and(|last| !last.trim().is_empty()) {
                output.push(Line::Blank);
            }
            output.extend(self.body_lines());
        }
        output
    }

    /// Apply the block to a whole file's content
    ///
    /// Kept lines keep their terminators, including `\r\n` and a missing
    /// final newline. New lines end in `\n`.
    pub fn apply(&self, content: &str) -> String {
        let raw: Vec<&str> = content.split_inclusive('\n').collect();
        let lines: Vec<&str> = raw
            .iter()
            .map(|line| line.trim_end_matches(['\n', '\r']))
            .collect();

        let mut output = String::with_capacity(content.len() + self.body_len() + 1);
        for line in self.upsert_lines(&lines) {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            match line {
                Line::Kept(index) => output.push_str(raw[index]),
                Line::Body(text) => {
                    output.push_str(text);
                    output.push('\n');
                }
                Line::Blank => output.push('\n'),
            }
        }
        output
    }

    fn body_lines(&self) -> impl Iterator<Item = Line<'_>> {
        self.body.iter().map(|line| Line::Body(line.as_str()))
    }

    fn is_end(&self, line: &str) -> bool {
        self.end.is_match(line) && !self.start.is_match(line)
    }

    fn body_len(&self) -> usize {
        self.body.iter().map(|line| line.len() + 1).sum()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| HostprovError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn invalid_block(reason: impl Into<String>) -> HostprovError {
    HostprovError::InvalidBlock {
        reason: reason.into(),
    }
}
