//! Peripheral seams.
//!
//! Pins and the I2C bus are plain `embedded-hal` 1.0 traits so any board
//! crate's drivers plug in. The two things `embedded-hal` has no trait for,
//! runtime bus frequency and pin-interrupt routing, are defined here.

use embedded_hal::digital::{InputPin, StatefulOutputPin};
use embedded_hal::i2c::I2c;

/// A pin usable by the `gpio` command: readable and toggleable.
pub trait GpioPin: InputPin + StatefulOutputPin {}

impl<T: InputPin + StatefulOutputPin> GpioPin for T {}

/// I2C bus whose clock can be changed at runtime.
pub trait I2cBus: I2c {
    /// Reconfigure the bus clock.
    fn set_frequency(&mut self, hz: u32) -> Result<(), Self::Error>;
}

/// Signal edge that fires an interrupt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low-to-high transition
    Raising,

    /// High-to-low transition
    Falling,
}

impl Edge {
    /// Parse the command-line spelling (`raising` / `falling`).
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "raising" => Some(Edge::Raising),
            "falling" => Some(Edge::Falling),
            _ => None,
        }
    }

    /// Command-line spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Edge::Raising => "raising",
            Edge::Falling => "falling",
        }
    }
}

/// Chip-level location of an interrupt-capable pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqRoute {
    /// GPIO port number on the chip
    pub port: u8,

    /// Pin number within the port
    pub pin: u8,
}

impl IrqRoute {
    /// Route for `port`/`pin`.
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

/// Routes pin edges to numbered interrupt channels.
///
/// The interrupt handler for channel `n` is expected to acknowledge the
/// hardware and call [`IrqPool::on_interrupt`](crate::commands::interrupt::IrqPool::on_interrupt).
pub trait InterruptController {
    /// Route `route` to `channel`, firing on `edge`, and unmask the channel.
    fn enable(&mut self, channel: usize, route: IrqRoute, edge: Edge);

    /// Mask `channel`.
    fn disable(&mut self, channel: usize);
}
