//! Test fixtures for mcu-shell testing.
//!
//! Provides:
//! - `MockUart`: Test implementation of the UART transmit side
//! - `TestPin`: Pin with shared, observable level and toggle count
//! - `MockI2c`: I2C bus recording every transaction
//! - `RecordingController`: Interrupt controller recording enable/disable calls

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{self, InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use mcu_shell::{Edge, I2cBus, InterruptController, IrqRoute};

// ============================================================================
// MockUart - UART transmit capture
// ============================================================================

/// Collects everything the transmit task writes.
#[derive(Debug, Default)]
pub struct MockUart {
    pub output: Vec<u8>,
}

impl embedded_io_async::ErrorType for MockUart {
    type Error = Infallible;
}

impl embedded_io_async::Write for MockUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ============================================================================
// TestPin - observable GPIO
// ============================================================================

/// Pin whose state is shared with the test through `Rc`.
#[derive(Debug, Clone, Default)]
pub struct TestPin {
    pub level: Rc<Cell<bool>>,
    pub toggles: Rc<Cell<u32>>,
}

impl digital::ErrorType for TestPin {
    type Error = Infallible;
}

impl InputPin for TestPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

impl OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for TestPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        self.level.set(!self.level.get());
        self.toggles.set(self.toggles.get() + 1);
        Ok(())
    }
}

// ============================================================================
// MockI2c - recording bus
// ============================================================================

/// One operation inside a bus transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cOp {
    Write(Vec<u8>),
    Read(usize),
}

/// Everything that reached the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cEvent {
    Frequency(u32),
    Transaction { address: u8, ops: Vec<I2cOp> },
}

/// Address that never acknowledges.
pub const ABSENT_DEVICE: u8 = 0x7f;

/// I2C bus that records transactions and reads back `0xa0, 0xa1, ...`.
#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    pub events: Rc<RefCell<Vec<I2cEvent>>>,
}

impl MockI2c {
    pub fn events(&self) -> Vec<I2cEvent> {
        self.events.borrow().clone()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl i2c::I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), ErrorKind> {
        if address == ABSENT_DEVICE {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut ops = Vec::new();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(data) => ops.push(I2cOp::Write(data.to_vec())),
                Operation::Read(buffer) => {
                    for (i, byte) in buffer.iter_mut().enumerate() {
                        *byte = 0xa0 + i as u8;
                    }
                    ops.push(I2cOp::Read(buffer.len()));
                }
            }
        }
        self.events
            .borrow_mut()
            .push(I2cEvent::Transaction { address, ops });
        Ok(())
    }
}

impl I2cBus for MockI2c {
    fn set_frequency(&mut self, hz: u32) -> Result<(), ErrorKind> {
        self.events.borrow_mut().push(I2cEvent::Frequency(hz));
        Ok(())
    }
}

// ============================================================================
// RecordingController - interrupt routing
// ============================================================================

/// Interrupt controller that records the routing it was asked for.
#[derive(Debug, Clone, Default)]
pub struct RecordingController {
    pub enabled: Rc<RefCell<Vec<(usize, IrqRoute, Edge)>>>,
    pub disabled: Rc<RefCell<Vec<usize>>>,
}

impl InterruptController for RecordingController {
    fn enable(&mut self, channel: usize, route: IrqRoute, edge: Edge) {
        self.enabled.borrow_mut().push((channel, route, edge));
    }

    fn disable(&mut self, channel: usize) {
        self.disabled.borrow_mut().push(channel);
    }
}
