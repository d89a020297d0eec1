//! Shared test helpers to reduce duplication across integration tests.

#![allow(dead_code)]

#[path = "fixtures/mod.rs"]
pub mod fixtures;

use core::future::Future;

use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use fixtures::{MockI2c, MockUart, RecordingController, TestPin};
use mcu_shell::commands::BOARD_TRIGGERS;
use mcu_shell::{
    BoardCommands, DefaultConfig, I2cPort, IrqPool, IrqRoute, LoopPool, Port, Registry, Shell,
    Terminal, board_registry,
};

/// Shell wired to the test board.
pub type TestShell<'a> =
    Shell<'a, BoardCommands<'a, TestPin, MockI2c, RecordingController>, DefaultConfig>;

// ============================================================================
// Board
// ============================================================================

/// Index of each port in [`Board::ports`].
pub const LED1: usize = 0;
pub const TEC1: usize = 1;
pub const LED2: usize = 2;

/// Everything a firmware image would keep in statics.
pub struct Board {
    pub terminal: Terminal,
    pub registry: Registry,
    pub pins: [TestPin; 3],
    pub ports: [Port<TestPin>; 3],
    pub bus: MockI2c,
    pub i2c: I2cPort<MockI2c>,
    pub controller: RecordingController,
    pub irq: IrqPool<RecordingController>,
    pub loops: LoopPool,
}

impl Board {
    pub fn new() -> Self {
        let pins: [TestPin; 3] = Default::default();
        let ports = [
            Port::new("LED1", pins[LED1].clone(), None),
            Port::new("TEC1", pins[TEC1].clone(), Some(IrqRoute::new(0, 4))),
            Port::new("LED2", pins[LED2].clone(), None),
        ];
        let bus = MockI2c::default();
        let controller = RecordingController::default();

        Self {
            terminal: Terminal::new(),
            registry: board_registry().unwrap(),
            pins,
            ports,
            i2c: I2cPort::new(bus.clone()),
            bus,
            irq: IrqPool::new(controller.clone(), &BOARD_TRIGGERS),
            controller,
            loops: LoopPool::new(),
        }
    }

    pub fn shell(&self) -> TestShell<'_> {
        let handlers = BoardCommands::new(&self.ports, &self.i2c, &self.irq, &self.loops);
        Shell::new(&self.terminal, &self.registry, handlers)
    }
}

// ============================================================================
// Output Capture Helpers
// ============================================================================

/// Run `fut` while a transmit task drains the terminal, returning everything
/// written to the UART.
pub async fn capture<F: Future>(terminal: &Terminal, fut: F) -> (F::Output, String) {
    let mut uart = MockUart::default();
    let output = match select(fut, terminal.drain(&mut uart)).await {
        Either::First(output) => output,
        Either::Second(never) => never,
    };

    while let Some(byte) = terminal.try_take_output() {
        uart.output.push(byte);
    }
    (output, String::from_utf8(uart.output).unwrap())
}

/// Execute a single command and return its output.
pub async fn execute_command(shell: &TestShell<'_>, line: &str) -> String {
    capture(shell.terminal(), shell.execute(line)).await.1
}

/// Execute several commands in order and return the combined output.
pub async fn execute_script(shell: &TestShell<'_>, lines: &[&str]) -> String {
    let script = async {
        for line in lines {
            shell.execute(line).await;
        }
    };
    capture(shell.terminal(), script).await.1
}

/// Run `fut` next to a worker task body that never returns.
pub async fn alongside<F: Future, W: Future>(fut: F, worker: W) -> F::Output {
    match select(fut, worker).await {
        Either::First(output) => output,
        Either::Second(_) => unreachable!("worker task returned"),
    }
}

// ============================================================================
// Input Helpers
// ============================================================================

/// Feed bytes through the receive interrupt path, waiting whenever the
/// receive queue is full.
pub async fn type_input(terminal: &Terminal, input: &[u8]) {
    for &byte in input {
        while !terminal.receive_from_isr(byte) {
            yield_now().await;
        }
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that output contains all expected strings.
pub fn assert_contains_all(output: &str, expected: &[&str]) {
    for s in expected {
        assert!(
            output.contains(s),
            "Expected output to contain '{}', got: {}",
            s,
            output
        );
    }
}

/// Number of times `needle` appears in `output`.
pub fn count(output: &str, needle: &str) -> usize {
    output.matches(needle).count()
}
