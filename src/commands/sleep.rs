//! `sleep` command.

use embassy_time::Timer;

use crate::error::CliError;
use crate::registry::{CommandKind, CommandMeta};
use crate::response::Response;
use crate::shell::Args;

/// `sleep` command metadata.
pub const CMD_SLEEP: CommandMeta = CommandMeta {
    name: "sleep",
    description: "Delay a given number of milliseconds",
    kind: CommandKind::Handler,
};

const USAGE: &str = "Usage: sleep <ms>\r\n   Eg: sleep 1000\r\n";

/// Suspend the calling task for `<ms>` milliseconds.
///
/// `<ms>` must fit a `u32`; larger values would overflow the tick conversion.
pub async fn execute(args: &Args<'_>) -> Result<Response, CliError> {
    if args.len() != 2 {
        return Err(CliError::Usage(USAGE));
    }
    let ms: u32 = args
        .get(1)
        .and_then(|token| token.parse().ok())
        .ok_or(CliError::Usage(USAGE))?;

    Timer::after_millis(u64::from(ms)).await;
    Ok(Response::silent())
}
