//! Interrupt channels and the `irq` command.
//!
//! A fixed pool of channels, each bindable to one pin edge and one captured
//! subcommand. The interrupt handler only signals the channel
//! ([`IrqPool::on_interrupt`]); the channel's worker task
//! ([`IrqPool::run_channel`]) does the actual command execution. Signals
//! collapse, so a burst of edges may run the subcommand once.
//!
//! `gpio <port> interrupt` binds through the same pool, on
//! `ShellConfig::GPIO_IRQ_CHANNEL`.

use core::cell::RefCell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::config::{IRQ_CHANNELS, MAX_RESPONSE, ShellConfig};
use crate::error::CliError;
use crate::hal::{Edge, InterruptController, IrqRoute};
use crate::registry::{CommandKind, CommandMeta};
use crate::response::Response;
use crate::shell::{Args, CommandHandler, Shell, Subcommand, extract_subcommand};
use crate::slots::SlotArena;

/// `irq` command metadata.
pub const CMD_IRQ: CommandMeta = CommandMeta {
    name: "irq",
    description: "Control IRQ handlers",
    kind: CommandKind::Handler,
};

const USAGE: &str = "Usage:\r\n\
    \x20 irq <channel> <trigger> <raising|falling> <command...>\r\n\
    \x20 irq <channel> disable\r\n\
    Examples:\r\n\
    \x20 irq 0 TEC1 falling echo hello\r\n\
    \x20 irq 0 disable\r\n";

/// A named pin that `irq` can bind to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Name used on the command line
    pub name: &'static str,

    /// Where the pin sits on the chip
    pub route: IrqRoute,
}

/// The four push buttons of the reference board.
pub const BOARD_TRIGGERS: [Trigger; 4] = [
    Trigger {
        name: "TEC1",
        route: IrqRoute::new(0, 4),
    },
    Trigger {
        name: "TEC2",
        route: IrqRoute::new(0, 8),
    },
    Trigger {
        name: "TEC3",
        route: IrqRoute::new(0, 9),
    },
    Trigger {
        name: "TEC4",
        route: IrqRoute::new(1, 9),
    },
];

/// Who configured a channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqOwner {
    /// `irq <channel> <trigger> ...`
    Trigger(&'static str),

    /// `gpio <port> interrupt ...`
    Port(&'static str),
}

/// Configuration of a bound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqBinding {
    /// Who bound the channel
    pub owner: IrqOwner,

    /// Pin routed to the channel
    pub route: IrqRoute,

    /// Edge that fires
    pub edge: Edge,

    /// Command executed on every notification
    pub subcommand: Subcommand,
}

/// Interrupt channel pool.
pub struct IrqPool<X: InterruptController> {
    controller: Mutex<CriticalSectionRawMutex, RefCell<X>>,
    bindings: Mutex<CriticalSectionRawMutex, RefCell<SlotArena<IrqBinding, IRQ_CHANNELS>>>,
    notify: [Signal<CriticalSectionRawMutex, ()>; IRQ_CHANNELS],
    triggers: &'static [Trigger],
}

impl<X: InterruptController> IrqPool<X> {
    /// Create a pool with every channel unbound.
    pub fn new(controller: X, triggers: &'static [Trigger]) -> Self {
        Self {
            controller: Mutex::new(RefCell::new(controller)),
            bindings: Mutex::new(RefCell::new(SlotArena::new())),
            notify: [const { Signal::new() }; IRQ_CHANNELS],
            triggers,
        }
    }

    /// Interrupt-context entry: wake the worker of `channel`.
    ///
    /// Never blocks. Out-of-range channels are ignored.
    pub fn on_interrupt(&self, channel: usize) {
        if let Some(signal) = self.notify.get(channel) {
            signal.signal(());
        }
    }

    /// Bind a free channel and enable its routing.
    ///
    /// Gives the binding back if the channel is taken or out of range.
    pub fn try_bind(&self, channel: usize, binding: IrqBinding) -> Result<(), IrqBinding> {
        let (route, edge) = (binding.route, binding.edge);
        self.bindings
            .lock(|bindings| bindings.borrow_mut().insert_at(channel, binding))?;

        // Drop any edge that arrived while the channel was unbound
        self.notify[channel].reset();
        self.controller
            .lock(|controller| controller.borrow_mut().enable(channel, route, edge));
        info!("irq channel {} bound, {} edge", channel, edge.as_str());
        Ok(())
    }

    /// Unbind `channel` if `accept` approves its current binding.
    pub fn unbind_if(
        &self,
        channel: usize,
        accept: impl FnOnce(&IrqBinding) -> bool,
    ) -> Option<IrqBinding> {
        let removed = self.bindings.lock(|bindings| {
            let mut bindings = bindings.borrow_mut();
            match bindings.get(channel) {
                Some(binding) if accept(binding) => bindings.remove(channel),
                _ => None,
            }
        })?;

        self.controller
            .lock(|controller| controller.borrow_mut().disable(channel));
        self.notify[channel].reset();
        info!("irq channel {} released", channel);
        Some(removed)
    }

    /// Current binding of `channel`.
    pub fn binding(&self, channel: usize) -> Option<IrqBinding> {
        self.bindings
            .lock(|bindings| bindings.borrow().get(channel).cloned())
    }

    /// Look up a board trigger by name.
    pub fn find_trigger(&self, name: &str) -> Option<&'static Trigger> {
        self.triggers.iter().find(|trigger| trigger.name == name)
    }

    /// Worker body for one channel: run the bound subcommand on every
    /// notification. Notifications for an unbound channel are ignored.
    pub async fn run_channel<H, C>(&self, channel: usize, shell: &Shell<'_, H, C>) -> !
    where
        H: CommandHandler<C>,
        C: ShellConfig,
    {
        let Some(signal) = self.notify.get(channel) else {
            error!("irq worker started for invalid channel {}", channel);
            loop {
                core::future::pending::<()>().await;
            }
        };

        loop {
            signal.wait().await;

            let Some(binding) = self.binding(channel) else {
                trace!("irq channel {} fired while unbound", channel);
                continue;
            };

            let mut banner: heapless::String<MAX_RESPONSE> = heapless::String::new();
            let _ = write!(
                banner,
                "GPIO triggered interrupt; executing `{}` command.",
                binding.subcommand.name()
            );
            shell.println(&banner).await;
            shell.execute_subcommand(&binding.subcommand).await;
        }
    }

    /// `irq <channel> <trigger> <raising|falling> <command...>` /
    /// `irq <channel> disable`
    pub fn execute(&self, args: &Args<'_>) -> Result<Response, CliError> {
        if args.len() < 3 {
            return Err(CliError::Usage(USAGE));
        }

        let channel = args
            .get(1)
            .and_then(|token| token.parse::<usize>().ok())
            .filter(|&channel| channel < IRQ_CHANNELS)
            .ok_or(CliError::Usage(USAGE))?;

        if args.len() == 3 && args.get(2) == Some("disable") {
            return match self.unbind_if(channel, |_| true) {
                Some(_) => Ok(Response::silent()),
                None => Err(CliError::NotConfigured("Channel is not active.")),
            };
        }

        if args.len() < 5 {
            return Err(CliError::Usage(USAGE));
        }

        let trigger = args
            .get(2)
            .and_then(|name| self.find_trigger(name))
            .ok_or(CliError::Usage(USAGE))?;
        let edge = args
            .get(3)
            .and_then(Edge::parse)
            .ok_or(CliError::Usage(USAGE))?;
        let subcommand = extract_subcommand(args, 4)?;

        let binding = IrqBinding {
            owner: IrqOwner::Trigger(trigger.name),
            route: trigger.route,
            edge,
            subcommand,
        };
        self.try_bind(channel, binding).map_err(|_| {
            CliError::AlreadyConfigured(
                "Channel is currently active. Disable it first with `irq <channel> disable`.",
            )
        })?;
        Ok(Response::silent())
    }
}

impl<X: InterruptController> core::fmt::Debug for IrqPool<X> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let bound = self.bindings.lock(|bindings| bindings.borrow().len());
        f.debug_struct("IrqPool")
            .field("bound", &bound)
            .field("triggers", &self.triggers.len())
            .finish_non_exhaustive()
    }
}
