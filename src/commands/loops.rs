//! Periodic subcommands: the `loop` command.
//!
//! A pool of `LOOP_SLOTS` slots, each with a pre-spawned worker task. `loop
//! start` stores the captured subcommand in the lowest free slot and wakes its
//! worker; `loop stop` frees the slot, which bumps the slot generation. Workers
//! compare generations only between executions, so a stop never interrupts a
//! running subcommand halfway.

use core::cell::RefCell;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use crate::config::{LOOP_SLOTS, ShellConfig};
use crate::error::CliError;
use crate::registry::{CommandKind, CommandMeta};
use crate::response::Response;
use crate::shell::{Args, CommandHandler, Shell, Subcommand, extract_subcommand};
use crate::slots::SlotArena;

/// `loop` command metadata.
pub const CMD_LOOP: CommandMeta = CommandMeta {
    name: "loop",
    description: "Spawn loop tasks",
    kind: CommandKind::Handler,
};

const USAGE: &str = "Usage:\r\n\
    \x20 loop start <period_ms> <command...>\r\n\
    \x20 loop stop <handle>\r\n\
    Example:\r\n\
    \x20 $ loop start 1000 gpio LED1 toggle\r\n\
    \x20 Loop handle: 0\r\n\
    \x20 $ loop stop 0\r\n";

#[derive(Debug, Clone)]
struct LoopEntry {
    period_ms: u32,
    subcommand: Subcommand,
}

/// Loop slot pool.
pub struct LoopPool {
    slots: Mutex<CriticalSectionRawMutex, RefCell<SlotArena<LoopEntry, LOOP_SLOTS>>>,
    wake: [Signal<CriticalSectionRawMutex, ()>; LOOP_SLOTS],
}

impl LoopPool {
    /// Create a pool with every slot free.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(SlotArena::new())),
            wake: [const { Signal::new() }; LOOP_SLOTS],
        }
    }

    /// Start a loop in the lowest free slot and return its handle.
    pub fn start(&self, period_ms: u32, subcommand: Subcommand) -> Result<usize, CliError> {
        let entry = LoopEntry {
            period_ms,
            subcommand,
        };
        let handle = self
            .slots
            .lock(|slots| slots.borrow_mut().insert(entry))
            .map_err(|_| {
                CliError::SlotsExhausted("Too many loops. Use `loop stop` to free a slot.")
            })?;

        self.wake[handle].signal(());
        info!("loop {} started, period {} ms", handle, period_ms);
        Ok(handle)
    }

    /// Stop the loop behind `handle`.
    pub fn stop(&self, handle: usize) -> Result<(), CliError> {
        self.slots
            .lock(|slots| slots.borrow_mut().remove(handle))
            .ok_or(CliError::NotConfigured("Loop task not started"))?;

        self.wake[handle].signal(());
        info!("loop {} stopped", handle);
        Ok(())
    }

    /// True if `handle` names a running loop.
    pub fn is_active(&self, handle: usize) -> bool {
        self.slots.lock(|slots| slots.borrow().is_occupied(handle))
    }

    /// Number of running loops.
    pub fn active(&self) -> usize {
        self.slots.lock(|slots| slots.borrow().len())
    }

    /// Period and generation of the entry in `handle`.
    fn snapshot(&self, handle: usize) -> Option<(u32, u32)> {
        self.slots.lock(|slots| {
            let slots = slots.borrow();
            slots
                .get(handle)
                .map(|entry| (entry.period_ms, slots.generation(handle)))
        })
    }

    /// Subcommand of `handle`, if the slot still holds generation `generation`.
    fn current(&self, handle: usize, generation: u32) -> Option<Subcommand> {
        self.slots.lock(|slots| {
            let slots = slots.borrow();
            if slots.generation(handle) != generation {
                return None;
            }
            slots.get(handle).map(|entry| entry.subcommand.clone())
        })
    }

    /// Worker body for one slot.
    ///
    /// Runs the slot's subcommand at a fixed rate (ticks are scheduled from
    /// the previous deadline, not from the end of the execution) until the
    /// slot is stopped, then waits for the next `loop start` to reuse it.
    pub async fn run_slot<H, C>(&self, handle: usize, shell: &Shell<'_, H, C>) -> !
    where
        H: CommandHandler<C>,
        C: ShellConfig,
    {
        let Some(wake) = self.wake.get(handle) else {
            error!("loop worker started for invalid slot {}", handle);
            loop {
                core::future::pending::<()>().await;
            }
        };

        loop {
            wake.reset();
            let Some((period_ms, generation)) = self.snapshot(handle) else {
                wake.wait().await;
                continue;
            };

            let mut ticker = Ticker::every(Duration::from_millis(u64::from(period_ms)));
            loop {
                if let Either::Second(()) = select(ticker.next(), wake.wait()).await {
                    if self.current(handle, generation).is_none() {
                        break;
                    }
                    continue;
                }

                let Some(subcommand) = self.current(handle, generation) else {
                    break;
                };
                shell.execute_subcommand(&subcommand).await;
            }
            debug!("loop {} worker idle", handle);
        }
    }

    /// `loop start <period_ms> <command...>` / `loop stop <handle>`
    pub fn execute(&self, args: &Args<'_>) -> Result<Response, CliError> {
        match (args.get(1), args.len()) {
            (Some("stop"), 3) => {
                let handle = args
                    .get(2)
                    .and_then(|token| token.parse::<usize>().ok())
                    .filter(|&handle| handle < LOOP_SLOTS)
                    .ok_or(CliError::Usage(USAGE))?;
                self.stop(handle)?;
                Ok(Response::silent())
            }
            (Some("start"), n) if n >= 4 => {
                let period_ms = args
                    .get(2)
                    .and_then(|token| token.parse::<u32>().ok())
                    .filter(|&period| period > 0)
                    .ok_or(CliError::Usage(USAGE))?;
                let subcommand = extract_subcommand(args, 3)?;
                let handle = self.start(period_ms, subcommand)?;
                Ok(Response::formatted(format_args!("Loop handle: {}", handle)))
            }
            _ => Err(CliError::Usage(USAGE)),
        }
    }
}

impl Default for LoopPool {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for LoopPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoopPool")
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}
