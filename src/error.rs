//! Error types for shell operations.
//!
//! `CliError` covers every failure a command line can run into: parse errors,
//! resource errors and state conflicts. None of them is fatal to the shell.
//! `RegistryError` is reported while the command registry is being built.

use core::fmt;

/// Longest command name kept in an `UnknownCommand` error.
pub const MAX_NAME_IN_ERROR: usize = 32;

/// CLI error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// No registered command with this name
    UnknownCommand(heapless::String<MAX_NAME_IN_ERROR>),

    /// Line produced too many tokens
    TooManyTokens {
        /// Token cap in effect
        max: usize,
    },

    /// Line did not fit the line buffer (remainder was discarded)
    LineTooLong {
        /// Longest accepted line, in bytes
        max: usize,
    },

    /// Input bytes were not valid UTF-8
    InvalidInput,

    /// Wrong command shape; carries the usage text to print
    Usage(&'static str),

    /// One argument could not be parsed
    InvalidArgument {
        /// Which argument (token index, command name is 0)
        arg_index: usize,
        /// What was expected (e.g., "integer", "port name")
        expected: &'static str,
    },

    /// Timed out waiting for a peripheral lock
    LockTimeout,

    /// Pin driver reported an error
    Pin(embedded_hal::digital::ErrorKind),

    /// I2C bus reported an error
    Bus(embedded_hal::i2c::ErrorKind),

    /// Fixed-capacity buffer exceeded
    BufferFull,

    /// Resource used before it was configured
    NotInitialized(&'static str),

    /// Resource is already configured
    AlreadyConfigured(&'static str),

    /// Resource has nothing configured to act on
    NotConfigured(&'static str),

    /// All slots of a pool are in use
    SlotsExhausted(&'static str),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::UnknownCommand(name) => write!(
                f,
                "unknown command `{}`. Type `help` for a list of commands.",
                name
            ),
            CliError::TooManyTokens { max } => {
                write!(f, "too many arguments (at most {} tokens)", max.saturating_sub(1))
            }
            CliError::LineTooLong { max } => {
                write!(f, "line too long (at most {} characters)", max.saturating_sub(1))
            }
            CliError::InvalidInput => write!(f, "invalid input characters"),
            CliError::Usage(text) => write!(f, "{}", text),
            CliError::InvalidArgument {
                arg_index,
                expected,
            } => write!(f, "argument {}: expected {}", arg_index, expected),
            CliError::LockTimeout => write!(f, "timed out waiting for port lock"),
            CliError::Pin(kind) => write!(f, "pin error: {}", kind),
            CliError::Bus(kind) => write!(f, "i2c error: {}", kind),
            CliError::BufferFull => write!(f, "buffer full"),
            CliError::NotInitialized(msg)
            | CliError::AlreadyConfigured(msg)
            | CliError::NotConfigured(msg)
            | CliError::SlotsExhausted(msg) => write!(f, "{}", msg),
        }
    }
}

impl CliError {
    /// Build an `UnknownCommand` error, truncating overlong names.
    pub fn unknown_command(name: &str) -> Self {
        let mut stored = heapless::String::new();
        for c in name.chars() {
            if stored.push(c).is_err() {
                break;
            }
        }
        CliError::UnknownCommand(stored)
    }

    /// Short static label for log output.
    pub fn label(&self) -> &'static str {
        match self {
            CliError::UnknownCommand(_) => "unknown command",
            CliError::TooManyTokens { .. } => "too many tokens",
            CliError::LineTooLong { .. } => "line too long",
            CliError::InvalidInput => "invalid input",
            CliError::Usage(_) => "usage",
            CliError::InvalidArgument { .. } => "invalid argument",
            CliError::LockTimeout => "lock timeout",
            CliError::Pin(_) => "pin error",
            CliError::Bus(_) => "bus error",
            CliError::BufferFull => "buffer full",
            CliError::NotInitialized(_) => "not initialized",
            CliError::AlreadyConfigured(_) => "already configured",
            CliError::NotConfigured(_) => "not configured",
            CliError::SlotsExhausted(_) => "slots exhausted",
        }
    }
}

/// Error building the command registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// A command with this name is already registered
    Duplicate(&'static str),

    /// Registry capacity exceeded
    Full,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate(name) => write!(f, "command `{}` registered twice", name),
            RegistryError::Full => write!(f, "command registry full"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::format;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", CliError::unknown_command("frob")),
            "unknown command `frob`. Type `help` for a list of commands."
        );
        assert_eq!(
            format!("{}", CliError::TooManyTokens { max: 10 }),
            "too many arguments (at most 9 tokens)"
        );
        assert_eq!(
            format!("{}", CliError::LineTooLong { max: 128 }),
            "line too long (at most 127 characters)"
        );

        let err = CliError::InvalidArgument {
            arg_index: 2,
            expected: "port name",
        };
        assert_eq!(format!("{}", err), "argument 2: expected port name");

        assert_eq!(
            format!("{}", CliError::NotInitialized("i2c init must be called first")),
            "i2c init must be called first"
        );
        assert_eq!(format!("{}", CliError::Usage("Usage: sleep <ms>")), "Usage: sleep <ms>");
    }

    #[test]
    fn test_unknown_command_truncates() {
        let long = "x".repeat(100);
        match CliError::unknown_command(&long) {
            CliError::UnknownCommand(name) => assert_eq!(name.len(), MAX_NAME_IN_ERROR),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(CliError::LockTimeout, CliError::LockTimeout);
        assert_ne!(CliError::LockTimeout, CliError::BufferFull);
        assert_eq!(
            RegistryError::Duplicate("echo"),
            RegistryError::Duplicate("echo")
        );
    }

    #[test]
    fn test_registry_error_display() {
        assert_eq!(
            format!("{}", RegistryError::Duplicate("echo")),
            "command `echo` registered twice"
        );
        assert_eq!(format!("{}", RegistryError::Full), "command registry full");
    }
}
