//! # mcu-shell
//!
//! Command shell for microcontroller boards, with zero heap allocation.
//!
//! **Key features:**
//! - **Static allocation** - Fixed-capacity buffers, command metadata in ROM
//! - **Interrupt-fed terminal** - UART receive ISR feeds a byte queue, one task drains output
//! - **Board commands** - `gpio`, `i2c`, `irq`, `loop`, `sleep`, `echo`, `help`
//! - **Background work** - Blink generators, periodic loops and interrupt actions run as
//!   pre-spawned async worker tasks that dispatch captured subcommands
//! - **Platform-agnostic** - Peripherals are `embedded-hal` 1.0 traits, the UART is
//!   `embedded-io-async`, tasks and timers are `embassy`
//!
//! ## Optional Features
//!
//! - `log` (default) - Internal diagnostics through the `log` facade
//! - `defmt` - Internal diagnostics through `defmt`
//!
//! This library is `no_std` compatible.

#![no_std]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::result_large_err)]

extern crate heapless;

// Must go first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// ============================================================================
// Module Declarations
// ============================================================================

// Foundation
pub mod config;
pub mod error;
pub mod io;

// Command model
pub mod registry;
pub mod response;
pub mod slots;

// Peripheral seams
pub mod hal;

// Shell orchestration
pub mod shell;

// Board command set
pub mod commands;

// ============================================================================
// Re-exports - Public API
// ============================================================================

// Terminal
pub use io::Terminal;

// Configuration
pub use config::{DefaultConfig, MinimalConfig, ShellConfig};

// Error types
pub use error::{CliError, RegistryError};

// Registry
pub use registry::{CMD_HELP, CommandKind, CommandMeta, Registry};

// Response types
pub use response::Response;

// Shell types
pub use shell::{Args, CommandHandler, LineReader, Shell, Subcommand};

// Peripheral traits
pub use hal::{Edge, GpioPin, I2cBus, InterruptController, IrqRoute};

// Board commands
pub use commands::{BoardCommands, I2cPort, IrqPool, LoopPool, Port, PortTable, board_registry};

// ============================================================================
// Library Metadata
// ============================================================================

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
