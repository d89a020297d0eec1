//! Shell orchestration and command processing.
//!
//! The `Shell` brings the terminal, the registry and the command handlers
//! together. It runs the prompt loop on the CLI task and is shared by
//! reference with the worker tasks (loops, interrupt channels), which
//! dispatch their captured subcommands through [`Shell::execute_subcommand`].

use core::fmt::Write;
use core::marker::PhantomData;

use crate::config::{MAX_RESPONSE, ShellConfig};
use crate::error::CliError;
use crate::io::Terminal;
use crate::registry::{CommandKind, Registry};
use crate::response::Response;

// Sub-modules
pub mod handler;
pub mod parser;
pub mod reader;

// Re-export key types
pub use handler::CommandHandler;
pub use parser::{Args, Subcommand, extract_subcommand, tokenize};
pub use reader::LineReader;

/// Shell orchestration struct.
///
/// Generic over:
/// - `'a`: Lifetime of the terminal and registry (typically 'static)
/// - `H`: CommandHandler implementation
/// - `C`: ShellConfig implementation
///
/// Every method takes `&self`, so one shell can be shared between the CLI
/// task and the workers.
pub struct Shell<'a, H, C>
where
    H: CommandHandler<C>,
    C: ShellConfig,
{
    /// Terminal queues
    terminal: &'a Terminal,

    /// Registered commands
    registry: &'a Registry,

    /// Command handlers
    handlers: H,

    /// Config type marker (zero-size)
    _config: PhantomData<C>,
}

// ============================================================================
// Debug implementation
// ============================================================================

impl<H, C> core::fmt::Debug for Shell<'_, H, C>
where
    H: CommandHandler<C>,
    C: ShellConfig,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Shell")
            .field("terminal", self.terminal)
            .field("commands", &self.registry.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Constructor
// ============================================================================

impl<'a, H, C> Shell<'a, H, C>
where
    H: CommandHandler<C>,
    C: ShellConfig,
{
    /// Create a shell over a terminal, a registry and the handlers for it.
    pub fn new(terminal: &'a Terminal, registry: &'a Registry, handlers: H) -> Self {
        Self {
            terminal,
            registry,
            handlers,
            _config: PhantomData,
        }
    }

    /// Terminal this shell talks to.
    pub fn terminal(&self) -> &'a Terminal {
        self.terminal
    }

    /// Registered commands.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Command handlers (worker tasks reach their pools through this).
    pub fn handlers(&self) -> &H {
        &self.handlers
    }
}

// ============================================================================
// Core methods
// ============================================================================

impl<H, C> Shell<'_, H, C>
where
    H: CommandHandler<C>,
    C: ShellConfig,
{
    /// Show the welcome message.
    pub async fn activate(&self) {
        self.terminal.write_str(C::MSG_WELCOME).await;
    }

    /// CLI task body: prompt, read a line, execute it, forever.
    pub async fn run(&self) -> ! {
        let mut reader = LineReader::new();
        info!("shell started, {} commands registered", self.registry.len());

        loop {
            self.terminal.write_str(C::PROMPT).await;
            match reader
                .read_line(self.terminal, C::MAX_LINE, C::ECHO_INPUT)
                .await
            {
                Ok(line) => self.execute(line).await,
                Err(e) => {
                    warn!("input rejected: {}", e.label());
                    self.write_error(&e).await;
                }
            }
        }
    }

    /// Tokenize and execute one command line, printing the outcome.
    ///
    /// Tokenizer errors are reported without invoking any handler.
    pub async fn execute(&self, line: &str) {
        let result = match tokenize(line, C::MAX_TOKENS) {
            Ok(args) => self.dispatch(&args).await,
            Err(e) => Err(e),
        };
        self.write_result(result).await;
    }

    /// Execute a captured subcommand, printing the outcome.
    pub async fn execute_subcommand(&self, subcommand: &Subcommand) {
        let result = match subcommand.args() {
            Ok(args) => self.dispatch(&args).await,
            Err(e) => Err(e),
        };
        self.write_result(result).await;
    }

    /// Look up token 0 and run the command.
    ///
    /// A blank line is a no-op. Argument validation is left to the handlers.
    pub async fn dispatch(&self, args: &Args<'_>) -> Result<Response, CliError> {
        let Some(name) = args.name() else {
            return Ok(Response::silent());
        };

        let Some(command) = self.registry.find(name) else {
            return Err(CliError::unknown_command(name));
        };

        debug!("dispatch `{}` ({} tokens)", command.name, args.len());
        match command.kind {
            CommandKind::Builtin => self.execute_builtin(command.name).await,
            CommandKind::Handler => self.handlers.execute(args).await,
        }
    }

    /// Print a string followed by `\r\n`.
    pub async fn println(&self, s: &str) {
        self.terminal.write_line(s).await;
    }

    async fn execute_builtin(&self, name: &str) -> Result<Response, CliError> {
        match name {
            "help" => {
                self.show_help().await;
                Ok(Response::silent())
            }
            _ => Err(CliError::unknown_command(name)),
        }
    }

    /// List registered commands, names padded to a common column.
    async fn show_help(&self) {
        let width = self
            .registry
            .iter()
            .map(|command| command.name.len())
            .max()
            .unwrap_or(0);

        for command in self.registry.iter() {
            let mut line: heapless::String<MAX_RESPONSE> = heapless::String::new();
            // Overlong descriptions are cut at the buffer end.
            let _ = write!(
                line,
                "  {:<width$}  {}",
                command.name,
                command.description,
                width = width
            );
            self.terminal.write_line(&line).await;
        }
    }

    async fn write_result(&self, result: Result<Response, CliError>) {
        match result {
            Ok(response) => self.write_formatted_response(&response).await,
            Err(e) => {
                warn!("command failed: {}", e.label());
                self.write_error(&e).await;
            }
        }
    }

    /// Write a response, applying its formatting flags.
    async fn write_formatted_response(&self, response: &Response) {
        self.terminal.write_str(&response.message).await;

        if response.postfix_newline {
            self.terminal.write_str("\r\n").await;
        }
    }

    /// Usage errors print their text; everything else as `Error: ...`.
    async fn write_error(&self, error: &CliError) {
        if let CliError::Usage(text) = error {
            self.terminal.write_str(text).await;
            return;
        }

        let mut line: heapless::String<MAX_RESPONSE> = heapless::String::new();
        let _ = write!(line, "Error: {}", error);
        self.terminal.write_line(&line).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
