//! Terminal byte queues between the UART and shell tasks.
//!
//! Input bytes are produced only by the UART receive interrupt through
//! [`Terminal::receive_from_isr`], which never blocks: when the input queue is
//! full the byte is dropped. Output bytes are queued by any task with
//! [`Terminal::put`] and drained by exactly one writer task running
//! [`Terminal::drain`]. Nothing else writes to the UART.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_io_async::Write;

use crate::config::{RX_QUEUE_CAPACITY, TX_QUEUE_CAPACITY};

/// Interrupt-fed input queue plus task-fed output queue.
///
/// `const`-constructible so it can live in a `static` shared with the UART ISR.
pub struct Terminal {
    rx: Channel<CriticalSectionRawMutex, u8, RX_QUEUE_CAPACITY>,
    tx: Channel<CriticalSectionRawMutex, u8, TX_QUEUE_CAPACITY>,
    dropped: Mutex<CriticalSectionRawMutex, Cell<u32>>,
}

impl Terminal {
    /// Create a terminal with empty queues.
    pub const fn new() -> Self {
        Self {
            rx: Channel::new(),
            tx: Channel::new(),
            dropped: Mutex::new(Cell::new(0)),
        }
    }

    /// Enqueue a received byte from interrupt context.
    ///
    /// Returns `false` if the input queue was full and the byte was dropped.
    pub fn receive_from_isr(&self, byte: u8) -> bool {
        if self.rx.try_send(byte).is_ok() {
            true
        } else {
            self.dropped
                .lock(|dropped| dropped.set(dropped.get().wrapping_add(1)));
            false
        }
    }

    /// Number of input bytes dropped because the input queue was full.
    pub fn dropped_bytes(&self) -> u32 {
        self.dropped.lock(Cell::get)
    }

    /// Wait for the next input byte.
    pub async fn get(&self) -> u8 {
        self.rx.receive().await
    }

    /// Queue one byte for output, waiting while the output queue is full.
    pub async fn put(&self, byte: u8) {
        self.tx.send(byte).await;
    }

    /// Queue a string for output.
    pub async fn write_str(&self, s: &str) {
        for byte in s.bytes() {
            self.put(byte).await;
        }
    }

    /// Queue a string followed by `\r\n`.
    pub async fn write_line(&self, s: &str) {
        self.write_str(s).await;
        self.write_str("\r\n").await;
    }

    /// Bytes currently waiting in the output queue.
    pub fn pending_output(&self) -> usize {
        self.tx.len()
    }

    /// Take one queued output byte without waiting.
    ///
    /// For interrupt-driven transmitters that refill the UART FIFO from the
    /// transmit-empty interrupt instead of running [`Terminal::drain`].
    pub fn try_take_output(&self) -> Option<u8> {
        self.tx.try_receive().ok()
    }

    /// Transmit task body: move queued output to the UART one byte at a time.
    ///
    /// Must run in exactly one task. Write errors drop the byte.
    pub async fn drain<W: Write>(&self, uart: &mut W) -> ! {
        loop {
            let byte = self.tx.receive().await;
            if uart.write_all(&[byte]).await.is_err() {
                warn!("uart write failed, dropping byte");
            }
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Terminal")
            .field("rx_len", &self.rx.len())
            .field("tx_len", &self.tx.len())
            .field("dropped", &self.dropped_bytes())
            .finish()
    }
}
