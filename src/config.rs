//! Configuration traits and storage capacities.
//!
//! Storage capacities are crate constants because they size `heapless`
//! buffers. Behavioral limits live in the `ShellConfig` trait so a firmware can
//! tighten them without touching buffer types. Each runtime limit must stay
//! within its storage capacity.

/// Line buffer storage, in bytes.
pub const LINE_CAPACITY: usize = 128;

/// Token storage per parsed line (command name included).
pub const TOKEN_CAPACITY: usize = 20;

/// Maximum number of registered commands.
pub const MAX_COMMANDS: usize = 16;

/// Maximum length of a single handler response.
pub const MAX_RESPONSE: usize = 256;

/// Terminal input queue depth (filled from the UART receive interrupt).
pub const RX_QUEUE_CAPACITY: usize = 128;

/// Terminal output queue depth (drained by the transmit task).
pub const TX_QUEUE_CAPACITY: usize = 128;

/// Number of `loop` slots.
pub const LOOP_SLOTS: usize = 4;

/// Number of interrupt channels.
pub const IRQ_CHANNELS: usize = 4;

/// Largest I2C payload accepted by `i2c ... write` / `read`.
pub const I2C_MAX_TRANSFER: usize = 32;

/// Shell configuration trait.
///
/// All values are const (zero runtime cost).
pub trait ShellConfig {
    /// Prompt printed before every line read.
    const PROMPT: &'static str;

    /// Banner printed once when the shell starts.
    const MSG_WELCOME: &'static str;

    /// Maximum line length including the terminator slot (<= `LINE_CAPACITY`).
    const MAX_LINE: usize;

    /// Token cap: a line must produce fewer than this many tokens (<= `TOKEN_CAPACITY`).
    const MAX_TOKENS: usize;

    /// Bounded wait for a GPIO port lock, in milliseconds.
    const PIN_LOCK_TIMEOUT_MS: u64;

    /// Upper bound accepted by `i2c init`, in Hz.
    const I2C_MAX_FREQUENCY_HZ: u32;

    /// Interrupt channel used by `gpio <port> interrupt`.
    const GPIO_IRQ_CHANNEL: usize;

    /// Echo received characters back to the terminal.
    const ECHO_INPUT: bool;
}

/// Default configuration.
///
/// - MAX_LINE: 128 bytes
/// - MAX_TOKENS: 20
/// - PIN_LOCK_TIMEOUT_MS: 100
/// - I2C_MAX_FREQUENCY_HZ: 1 MHz
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DefaultConfig;

impl ShellConfig for DefaultConfig {
    const PROMPT: &'static str = "$ ";
    const MSG_WELCOME: &'static str = "mcu-shell ready. Type `help` for a list of commands.\r\n";
    const MAX_LINE: usize = 128;
    const MAX_TOKENS: usize = 20;
    const PIN_LOCK_TIMEOUT_MS: u64 = 100;
    const I2C_MAX_FREQUENCY_HZ: u32 = 1_000_000;
    const GPIO_IRQ_CHANNEL: usize = 0;
    const ECHO_INPUT: bool = false;
}

/// Reduced limits for small boards and terminals.
///
/// - MAX_LINE: 80 bytes
/// - MAX_TOKENS: 10
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MinimalConfig;

impl ShellConfig for MinimalConfig {
    const PROMPT: &'static str = "> ";
    const MSG_WELCOME: &'static str = "";
    const MAX_LINE: usize = 80;
    const MAX_TOKENS: usize = 10;
    const PIN_LOCK_TIMEOUT_MS: u64 = 100;
    const I2C_MAX_FREQUENCY_HZ: u32 = 1_000_000;
    const GPIO_IRQ_CHANNEL: usize = 0;
    const ECHO_INPUT: bool = false;
}
