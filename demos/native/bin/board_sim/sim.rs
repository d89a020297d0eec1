//! Simulated board peripherals.

use std::cell::Cell;
use std::convert::Infallible;
use std::io::Write as _;
use std::rc::Rc;

use embedded_hal::digital::{self, InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{self, ErrorKind, Operation};
use embedded_io_async::ErrorKind as UartErrorKind;
use mcu_shell::{Edge, I2cBus, InterruptController, IrqRoute};

// =============================================================================
// UART
// =============================================================================

/// Transmit side of the terminal: stdout.
pub struct StdoutUart;

impl embedded_io_async::ErrorType for StdoutUart {
    type Error = UartErrorKind;
}

impl embedded_io_async::Write for StdoutUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut stdout = std::io::stdout();
        stdout.write_all(buf).map_err(|_| UartErrorKind::Other)?;
        stdout.flush().map_err(|_| UartErrorKind::Other)?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::stdout().flush().map_err(|_| UartErrorKind::Other)
    }
}

// =============================================================================
// GPIO
// =============================================================================

/// Pin that logs every level change.
pub struct SimPin {
    name: &'static str,
    level: bool,
}

impl SimPin {
    pub fn new(name: &'static str) -> Self {
        Self { name, level: false }
    }

    fn set(&mut self, level: bool) {
        if self.level != level {
            log::info!("{} {}", self.name, if level { "on" } else { "off" });
        }
        self.level = level;
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level)
    }
}

// =============================================================================
// I2C
// =============================================================================

/// Bus with one device at 0x68 that answers reads with a counter.
#[derive(Default)]
pub struct SimBus {
    counter: u8,
}

pub const SIM_DEVICE: u8 = 0x68;

impl i2c::ErrorType for SimBus {
    type Error = ErrorKind;
}

impl i2c::I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), ErrorKind> {
        if address != SIM_DEVICE {
            return Err(ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
        }
        for operation in operations {
            match operation {
                Operation::Write(data) => log::info!("i2c {:02x} <- {:02x?}", address, data),
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.counter;
                        self.counter = self.counter.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

impl I2cBus for SimBus {
    fn set_frequency(&mut self, hz: u32) -> Result<(), ErrorKind> {
        log::info!("i2c clock {} Hz", hz);
        Ok(())
    }
}

// =============================================================================
// Interrupt routing
// =============================================================================

/// Controller that publishes the enabled channels as a bit mask.
pub struct SimController {
    enabled: Rc<Cell<u8>>,
}

impl SimController {
    pub fn new(enabled: Rc<Cell<u8>>) -> Self {
        Self { enabled }
    }
}

impl InterruptController for SimController {
    fn enable(&mut self, channel: usize, route: IrqRoute, edge: Edge) {
        log::info!(
            "irq {} <- P{}.{} {}",
            channel,
            route.port,
            route.pin,
            edge.as_str()
        );
        self.enabled.set(self.enabled.get() | 1 << channel);
    }

    fn disable(&mut self, channel: usize) {
        self.enabled.set(self.enabled.get() & !(1 << channel));
    }
}
