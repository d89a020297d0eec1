//! Response types for command execution.
//!
//! `Response` represents successful execution with message and formatting flags.

use core::fmt::Write;

use crate::config::MAX_RESPONSE;

/// Command execution response with message and formatting flags.
/// Command failures return `Err(CliError)`, not `Response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response message
    pub message: heapless::String<MAX_RESPONSE>,

    /// Add newline after message
    pub postfix_newline: bool,
}

impl Response {
    /// Create success response with default formatting (message + newline).
    ///
    /// Messages longer than `MAX_RESPONSE` are truncated.
    pub fn success(message: &str) -> Self {
        let mut msg = heapless::String::new();
        for c in message.chars() {
            if msg.push(c).is_err() {
                break;
            }
        }

        Self {
            message: msg,
            postfix_newline: true,
        }
    }

    /// Create success response from format arguments.
    pub fn formatted(args: core::fmt::Arguments<'_>) -> Self {
        let mut response = Self::success("");
        // Overflow truncates; the part that fit is still shown.
        let _ = response.message.write_fmt(args);
        response
    }

    /// Response that prints nothing at all.
    pub fn silent() -> Self {
        Self::success("").without_postfix_newline()
    }

    /// Builder method to suppress newline after response.
    pub fn without_postfix_newline(mut self) -> Self {
        self.postfix_newline = false;
        self
    }

    /// True when rendering this response writes nothing.
    pub fn is_silent(&self) -> bool {
        self.message.is_empty() && !self.postfix_newline
    }
}
