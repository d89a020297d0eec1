//! Board command set.
//!
//! Each command family lives in its own module with its `CommandMeta` and its
//! state (ports, bus, pools). [`BoardCommands`] ties them together and
//! implements [`CommandHandler`] by matching on the command name.

use crate::config::ShellConfig;
use crate::error::{CliError, RegistryError};
use crate::hal::{GpioPin, I2cBus, InterruptController};
use crate::registry::{CMD_HELP, CommandMeta, Registry};
use crate::response::Response;
use crate::shell::{Args, CommandHandler};

pub mod echo;
pub mod gpio;
pub mod i2c;
pub mod interrupt;
pub mod loops;
pub mod sleep;

pub use echo::CMD_ECHO;
pub use gpio::{CMD_GPIO, Port, PortTable};
pub use i2c::{CMD_I2C, I2cPort};
pub use interrupt::{BOARD_TRIGGERS, CMD_IRQ, IrqBinding, IrqOwner, IrqPool, Trigger};
pub use loops::{CMD_LOOP, LoopPool};
pub use sleep::CMD_SLEEP;

/// Every board command, in `help` order.
pub static BOARD_COMMANDS: [&CommandMeta; 7] = [
    &CMD_HELP, &CMD_ECHO, &CMD_SLEEP, &CMD_LOOP, &CMD_GPIO, &CMD_IRQ, &CMD_I2C,
];

/// Registry holding [`BOARD_COMMANDS`].
pub fn board_registry() -> Result<Registry, RegistryError> {
    Registry::from_commands(&BOARD_COMMANDS)
}

/// Handlers for the board command set.
///
/// Holds references so the same ports and pools can be handed to the worker
/// tasks.
pub struct BoardCommands<'a, P, B, X>
where
    P: GpioPin,
    B: I2cBus,
    X: InterruptController,
{
    ports: PortTable<'a, P>,
    i2c: &'a I2cPort<B>,
    irq: &'a IrqPool<X>,
    loops: &'a LoopPool,
}

impl<'a, P, B, X> BoardCommands<'a, P, B, X>
where
    P: GpioPin,
    B: I2cBus,
    X: InterruptController,
{
    /// Bundle the board peripherals.
    pub fn new(
        ports: &'a [Port<P>],
        i2c: &'a I2cPort<B>,
        irq: &'a IrqPool<X>,
        loops: &'a LoopPool,
    ) -> Self {
        Self {
            ports: PortTable::new(ports),
            i2c,
            irq,
            loops,
        }
    }

    /// GPIO ports (for the blink workers).
    pub fn ports(&self) -> PortTable<'a, P> {
        self.ports
    }

    /// Interrupt channels (for the ISR and the channel workers).
    pub fn irq(&self) -> &'a IrqPool<X> {
        self.irq
    }

    /// Loop slots (for the loop workers).
    pub fn loops(&self) -> &'a LoopPool {
        self.loops
    }
}

impl<P, B, X, C> CommandHandler<C> for BoardCommands<'_, P, B, X>
where
    P: GpioPin,
    B: I2cBus,
    X: InterruptController,
    C: ShellConfig,
{
    async fn execute(&self, args: &Args<'_>) -> Result<Response, CliError> {
        match args.name() {
            Some("echo") => echo::execute(args),
            Some("sleep") => sleep::execute(args).await,
            Some("loop") => self.loops.execute(args),
            Some("gpio") => self.ports.execute::<C, X>(self.irq, args).await,
            Some("irq") => self.irq.execute(args),
            Some("i2c") => self.i2c.execute::<C>(args).await,
            Some(name) => Err(CliError::unknown_command(name)),
            None => Ok(Response::silent()),
        }
    }
}

impl<P, B, X> core::fmt::Debug for BoardCommands<'_, P, B, X>
where
    P: GpioPin,
    B: I2cBus,
    X: InterruptController,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoardCommands")
            .field("ports", &self.ports.len())
            .field("irq", self.irq)
            .field("loops", self.loops)
            .finish_non_exhaustive()
    }
}
