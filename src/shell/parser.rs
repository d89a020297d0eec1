//! Line tokenizer and subcommand extraction.
//!
//! Tokens are borrowed views into the line buffer, so an [`Args`] lives no
//! longer than the line it was split from. Anything that must outlive the
//! prompt iteration (loop bodies, interrupt actions) is captured as an owned
//! [`Subcommand`] instead.

use core::fmt::Write;

use crate::config::{LINE_CAPACITY, TOKEN_CAPACITY};
use crate::error::CliError;

/// Characters separating tokens.
const SEPARATORS: [char; 2] = [' ', '\t'];

/// Tokens of one command line, command name at index 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Args<'a> {
    tokens: heapless::Vec<&'a str, TOKEN_CAPACITY>,
}

impl<'a> Args<'a> {
    /// Command name (token 0), if any.
    pub fn name(&self) -> Option<&'a str> {
        self.tokens.first().copied()
    }

    /// Token at `index`.
    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).copied()
    }

    /// Number of tokens, command name included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True for a blank line.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All tokens.
    pub fn as_slice(&self) -> &[&'a str] {
        &self.tokens
    }

    /// Tokens from `from` onwards (empty if out of range).
    pub fn rest(&self, from: usize) -> &[&'a str] {
        self.tokens.get(from..).unwrap_or(&[])
    }

    /// Tokens joined with single spaces.
    pub fn join(&self) -> Result<heapless::String<LINE_CAPACITY>, CliError> {
        join_tokens(self.as_slice())
    }
}

/// Split `line` on runs of spaces and tabs.
///
/// A line may produce at most `max_tokens - 1` tokens (and never more than
/// `TOKEN_CAPACITY`). Anything beyond that is rejected, not truncated.
pub fn tokenize(line: &str, max_tokens: usize) -> Result<Args<'_>, CliError> {
    let limit = max_tokens.saturating_sub(1).min(TOKEN_CAPACITY);
    let mut args = Args::default();

    for token in line.split(SEPARATORS).filter(|t| !t.is_empty()) {
        if args.tokens.len() >= limit {
            return Err(CliError::TooManyTokens { max: limit + 1 });
        }
        args.tokens
            .push(token)
            .map_err(|_| CliError::TooManyTokens { max: limit + 1 })?;
    }

    Ok(args)
}

fn join_tokens(tokens: &[&str]) -> Result<heapless::String<LINE_CAPACITY>, CliError> {
    let mut joined = heapless::String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            joined.push(' ').map_err(|_| CliError::BufferFull)?;
        }
        joined.write_str(token).map_err(|_| CliError::BufferFull)?;
    }
    Ok(joined)
}

/// Owned copy of the tail of a command line, executed later by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcommand {
    line: heapless::String<LINE_CAPACITY>,
}

impl Subcommand {
    /// Capture a command line as-is.
    pub fn new(line: &str) -> Result<Self, CliError> {
        let mut owned = heapless::String::new();
        owned.push_str(line).map_err(|_| CliError::BufferFull)?;
        Ok(Self { line: owned })
    }

    /// The captured line.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Name of the captured command (its first token).
    pub fn name(&self) -> &str {
        self.line.split(SEPARATORS).find(|t| !t.is_empty()).unwrap_or("")
    }

    /// Re-tokenize the captured line.
    pub fn args(&self) -> Result<Args<'_>, CliError> {
        tokenize(&self.line, TOKEN_CAPACITY + 1)
    }
}

/// Copy tokens `start..` of `args` into an owned [`Subcommand`].
///
/// The caller decides what an empty tail means; here it is reported as a
/// missing `command` argument at `start`.
pub fn extract_subcommand(args: &Args<'_>, start: usize) -> Result<Subcommand, CliError> {
    let tail = args.rest(start);
    if tail.is_empty() {
        return Err(CliError::InvalidArgument {
            arg_index: start,
            expected: "command",
        });
    }
    Ok(Subcommand {
        line: join_tokens(tail)?,
    })
}
