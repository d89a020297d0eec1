//! Host simulation of an mcu-shell board.
//!
//! Runs the same task layout a firmware image would: one CLI task, one UART
//! transmit task, a blink worker per port, a worker per loop slot and per
//! interrupt channel. Stdin stands in for the UART receive interrupt and a
//! timer "presses" every button that has an interrupt routed to it.
//!
//! To run:
//! ```bash
//! cargo run --bin board_sim
//! ```
//!
//! Try `loop start 1000 gpio LED1 toggle` or
//! `gpio TEC1 interrupt falling echo pressed`.

mod logger;
mod sim;

use std::cell::Cell;
use std::io::Read;
use std::rc::Rc;
use std::time::Duration as StdDuration;

use embassy_time::Timer;
use log::LevelFilter;
use mcu_shell::commands::BOARD_TRIGGERS;
use mcu_shell::config::IRQ_CHANNELS;
use mcu_shell::{
    BoardCommands, DefaultConfig, I2cPort, IrqPool, LoopPool, Port, Shell, Terminal, board_registry,
};
use sim::{SimBus, SimController, SimPin, StdoutUart};

/// Shared with the "interrupt" thread, like a firmware `static`.
static TERMINAL: Terminal = Terminal::new();

const BUTTON_PERIOD_MS: u64 = 5_000;

/// Stdin reader standing in for the UART receive interrupt.
fn spawn_uart_rx() {
    std::thread::spawn(|| {
        for byte in std::io::stdin().bytes() {
            let Ok(byte) = byte else { break };
            while !TERMINAL.receive_from_isr(byte) {
                std::thread::sleep(StdDuration::from_millis(1));
            }
        }
    });
}

/// Fire every routed channel periodically.
async fn press_buttons(irq: &IrqPool<SimController>, enabled: &Cell<u8>) -> ! {
    loop {
        Timer::after_millis(BUTTON_PERIOD_MS).await;
        for channel in 0..IRQ_CHANNELS {
            if enabled.get() & (1 << channel) != 0 {
                irq.on_interrupt(channel);
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logger::init(LevelFilter::Info);
    spawn_uart_rx();

    let ports = [
        Port::new("LED1", SimPin::new("LED1"), None),
        Port::new("LED2", SimPin::new("LED2"), None),
        Port::new("LED3", SimPin::new("LED3"), None),
        Port::new("TEC1", SimPin::new("TEC1"), Some(BOARD_TRIGGERS[0].route)),
    ];
    let registry = board_registry().expect("board commands fit the registry");
    let i2c = I2cPort::new(SimBus::default());
    let enabled = Rc::new(Cell::new(0u8));
    let irq = IrqPool::new(SimController::new(enabled.clone()), &BOARD_TRIGGERS);
    let loops = LoopPool::new();

    let handlers = BoardCommands::new(&ports, &i2c, &irq, &loops);
    let shell: Shell<'_, _, DefaultConfig> = Shell::new(&TERMINAL, &registry, handlers);
    let port_table = shell.handlers().ports();
    let mut uart = StdoutUart;

    shell.activate().await;

    tokio::join!(
        shell.run(),
        TERMINAL.drain(&mut uart),
        port_table.run_blinker(0),
        port_table.run_blinker(1),
        port_table.run_blinker(2),
        port_table.run_blinker(3),
        loops.run_slot(0, &shell),
        loops.run_slot(1, &shell),
        loops.run_slot(2, &shell),
        loops.run_slot(3, &shell),
        irq.run_channel(0, &shell),
        irq.run_channel(1, &shell),
        irq.run_channel(2, &shell),
        irq.run_channel(3, &shell),
        press_buttons(&irq, &enabled),
    );
}
