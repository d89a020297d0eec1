//! Command registry.
//!
//! Command metadata is const-initializable and lives in ROM. The registry is an
//! append-only list of `&'static CommandMeta` built once at startup; names are
//! unique, lookup is an exact, case-sensitive linear scan in registration order.
//! Execution logic is provided separately via the `CommandHandler` trait.

use crate::config::MAX_COMMANDS;
use crate::error::RegistryError;

/// How a command is executed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Executed by the shell itself (needs the registry, e.g. `help`)
    Builtin,

    /// Executed by the `CommandHandler`
    Handler,
}

/// Command metadata (const-initializable, no execution logic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMeta {
    /// Command name (token 0 of the line)
    pub name: &'static str,

    /// Command description (shown by `help`)
    pub description: &'static str,

    /// Who executes the command
    pub kind: CommandKind,
}

/// The built-in `help` command.
pub const CMD_HELP: CommandMeta = CommandMeta {
    name: "help",
    description: "List available commands",
    kind: CommandKind::Builtin,
};

/// Ordered set of registered commands.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: heapless::Vec<&'static CommandMeta, MAX_COMMANDS>,
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            commands: heapless::Vec::new(),
        }
    }

    /// Build a registry from a list of commands, in order.
    pub fn from_commands(commands: &[&'static CommandMeta]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for &command in commands {
            registry.register(command)?;
        }
        Ok(registry)
    }

    /// Append a command. Names must be unique.
    pub fn register(&mut self, command: &'static CommandMeta) -> Result<(), RegistryError> {
        if self.find(command.name).is_some() {
            return Err(RegistryError::Duplicate(command.name));
        }
        self.commands
            .push(command)
            .map_err(|_| RegistryError::Full)
    }

    /// Find a command by exact name (first registered wins).
    pub fn find(&self, name: &str) -> Option<&'static CommandMeta> {
        self.commands
            .iter()
            .find(|command| command.name == name)
            .copied()
    }

    /// Registered commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static CommandMeta> + '_ {
        self.commands.iter().copied()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
