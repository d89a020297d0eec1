//! Command handler trait for executing commands.
//!
//! Implements the execution side of the metadata/execution separation
//! pattern: the registry knows names and descriptions, the handler knows what
//! a name does.

use crate::config::ShellConfig;
use crate::error::CliError;
use crate::response::Response;
use crate::shell::parser::Args;

/// Command execution handler trait.
///
/// `args` is the full token list, command name at index 0. Handlers take
/// `&self` because worker tasks may dispatch concurrently with the CLI task.
pub trait CommandHandler<C: ShellConfig> {
    /// Execute the command named by `args.name()`.
    /// Uses `async fn` without Send bounds for single-core executors.
    #[allow(async_fn_in_trait)]
    async fn execute(&self, args: &Args<'_>) -> Result<Response, CliError>;
}
