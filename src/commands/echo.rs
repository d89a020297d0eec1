//! `echo` command.

use core::fmt::Write;

use crate::error::CliError;
use crate::registry::{CommandKind, CommandMeta};
use crate::response::Response;
use crate::shell::Args;

/// `echo` command metadata.
pub const CMD_ECHO: CommandMeta = CommandMeta {
    name: "echo",
    description: "Print some text",
    kind: CommandKind::Handler,
};

/// Print the arguments joined with single spaces.
pub fn execute(args: &Args<'_>) -> Result<Response, CliError> {
    let mut response = Response::success("");
    for (i, word) in args.rest(1).iter().enumerate() {
        if i > 0 {
            response.message.push(' ').map_err(|_| CliError::BufferFull)?;
        }
        response
            .message
            .write_str(word)
            .map_err(|_| CliError::BufferFull)?;
    }
    Ok(response)
}
