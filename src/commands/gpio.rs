//! GPIO ports and the `gpio` command.
//!
//! Every physical port has a name, a pin behind an async mutex, a blink
//! generator and, if the pin is interrupt-capable, its chip routing. Pin
//! accesses from the command wait at most `ShellConfig::PIN_LOCK_TIMEOUT_MS`
//! for the lock; the blink worker waits at most a quarter period and skips the
//! toggle when the port is busy.

use core::cell::Cell;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, with_timeout};
use embedded_hal::digital::Error as _;

use crate::config::ShellConfig;
use crate::error::CliError;
use crate::hal::{Edge, GpioPin, InterruptController, IrqRoute};
use crate::registry::{CommandKind, CommandMeta};
use crate::response::Response;
use crate::shell::{Args, extract_subcommand};

use super::interrupt::{IrqBinding, IrqOwner, IrqPool};

/// `gpio` command metadata.
pub const CMD_GPIO: CommandMeta = CommandMeta {
    name: "gpio",
    description: "Control GPIO ports",
    kind: CommandKind::Handler,
};

const USAGE: &str = "Usage:\r\n\
    \x20 gpio <port> read\r\n\
    \x20 gpio <port> write <0|1>\r\n\
    \x20 gpio <port> toggle\r\n\
    \x20 gpio <port> blink <period_ms>\r\n\
    \x20 gpio <port> interrupt <raising|falling> <command...>\r\n\
    \x20 gpio <port> interrupt disable\r\n\
    Examples:\r\n\
    \x20 gpio LED1 blink 500\r\n\
    \x20 gpio TEC1 interrupt falling echo pressed\r\n";

#[derive(Debug, Copy, Clone)]
struct BlinkState {
    /// Full blink period, 0 when stopped
    period_ms: u32,
    /// Bumped on every `blink` command
    generation: u32,
}

/// One GPIO port.
pub struct Port<P: GpioPin> {
    name: &'static str,
    pin: Mutex<CriticalSectionRawMutex, P>,
    blink: BlockingMutex<CriticalSectionRawMutex, Cell<BlinkState>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    route: Option<IrqRoute>,
}

impl<P: GpioPin> Port<P> {
    /// Create a port. `route` is the chip location used by `interrupt`.
    pub const fn new(name: &'static str, pin: P, route: Option<IrqRoute>) -> Self {
        Self {
            name,
            pin: Mutex::new(pin),
            blink: BlockingMutex::new(Cell::new(BlinkState {
                period_ms: 0,
                generation: 0,
            })),
            wake: Signal::new(),
            route,
        }
    }

    /// Port name as typed on the command line.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Interrupt routing, if the pin can raise interrupts.
    pub fn route(&self) -> Option<IrqRoute> {
        self.route
    }

    /// Current blink period (0 when not blinking).
    pub fn blink_period_ms(&self) -> u32 {
        self.blink.lock(|state| state.get().period_ms)
    }

    /// Lock the pin, giving up after `timeout_ms`.
    pub async fn lock(
        &self,
        timeout_ms: u64,
    ) -> Result<MutexGuard<'_, CriticalSectionRawMutex, P>, CliError> {
        with_timeout(Duration::from_millis(timeout_ms), self.pin.lock())
            .await
            .map_err(|_| {
                warn!("gpio {}: lock timeout", self.name);
                CliError::LockTimeout
            })
    }

    /// Replace the blink generator. A period of 0 stops it.
    pub fn set_blink(&self, period_ms: u32) {
        self.blink.lock(|state| {
            let current = state.get();
            state.set(BlinkState {
                period_ms,
                generation: current.generation.wrapping_add(1),
            });
        });
        self.wake.signal(());
        debug!("gpio {}: blink period {} ms", self.name, period_ms);
    }

    /// Blink worker body for this port.
    ///
    /// Idles until a period is set, then toggles every half period until the
    /// generator is replaced. The pin guard is released before every
    /// generation check.
    pub async fn run_blinker(&self) -> ! {
        loop {
            self.wake.reset();
            let BlinkState {
                period_ms,
                generation,
            } = self.blink.lock(Cell::get);

            if period_ms == 0 {
                self.wake.wait().await;
                continue;
            }

            let half = Duration::from_millis(u64::from((period_ms / 2).max(1)));
            let bound = Duration::from_millis(u64::from((period_ms / 4).max(1)));
            let mut ticker = Ticker::every(half);

            while self.blink.lock(Cell::get).generation == generation {
                match with_timeout(bound, self.pin.lock()).await {
                    Ok(mut pin) => {
                        if pin.toggle().is_err() {
                            warn!("gpio {}: blink toggle failed", self.name);
                        }
                    }
                    Err(_) => trace!("gpio {}: busy, blink step skipped", self.name),
                }

                if let Either::Second(()) = select(ticker.next(), self.wake.wait()).await {
                    break;
                }
            }
        }
    }
}

impl<P: GpioPin> core::fmt::Debug for Port<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("route", &self.route)
            .field("blink_period_ms", &self.blink_period_ms())
            .finish_non_exhaustive()
    }
}

/// The board's GPIO ports, in a fixed table.
#[derive(Debug)]
pub struct PortTable<'a, P: GpioPin> {
    ports: &'a [Port<P>],
}

impl<P: GpioPin> Clone for PortTable<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: GpioPin> Copy for PortTable<'_, P> {}

impl<'a, P: GpioPin> PortTable<'a, P> {
    /// Wrap a port table.
    pub const fn new(ports: &'a [Port<P>]) -> Self {
        Self { ports }
    }

    /// Find a port by exact name.
    pub fn find(&self, name: &str) -> Option<&'a Port<P>> {
        self.ports.iter().find(|port| port.name == name)
    }

    /// Port at `index`.
    pub fn get(&self, index: usize) -> Option<&'a Port<P>> {
        self.ports.get(index)
    }

    /// Number of ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True if the board has no ports.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Blink worker for the port at `index`. One task per port.
    pub async fn run_blinker(&self, index: usize) -> ! {
        match self.ports.get(index) {
            Some(port) => port.run_blinker().await,
            None => {
                error!("blink worker started for invalid port {}", index);
                loop {
                    core::future::pending::<()>().await;
                }
            }
        }
    }

    /// `gpio <port> ...`
    pub async fn execute<C, X>(
        &self,
        irq: &IrqPool<X>,
        args: &Args<'_>,
    ) -> Result<Response, CliError>
    where
        C: ShellConfig,
        X: InterruptController,
    {
        if args.len() < 3 {
            return Err(CliError::Usage(USAGE));
        }

        let port = args
            .get(1)
            .and_then(|name| self.find(name))
            .ok_or(CliError::InvalidArgument {
                arg_index: 1,
                expected: "port name",
            })?;

        match (args.get(2), args.len()) {
            (Some("read"), 3) => {
                let mut pin = port.lock(C::PIN_LOCK_TIMEOUT_MS).await?;
                let high = pin.is_high().map_err(|e| CliError::Pin(e.kind()))?;
                Ok(Response::success(if high { "1" } else { "0" }))
            }
            (Some("write"), 4) => {
                let high = match args.get(3) {
                    Some("1") => true,
                    Some("0") => false,
                    _ => return Err(CliError::Usage(USAGE)),
                };
                let mut pin = port.lock(C::PIN_LOCK_TIMEOUT_MS).await?;
                let result = if high { pin.set_high() } else { pin.set_low() };
                result.map_err(|e| CliError::Pin(e.kind()))?;
                Ok(Response::silent())
            }
            (Some("toggle"), 3) => {
                let mut pin = port.lock(C::PIN_LOCK_TIMEOUT_MS).await?;
                pin.toggle().map_err(|e| CliError::Pin(e.kind()))?;
                Ok(Response::silent())
            }
            (Some("blink"), 4) => {
                let period_ms: u32 = args
                    .get(3)
                    .and_then(|token| token.parse().ok())
                    .ok_or(CliError::Usage(USAGE))?;
                port.set_blink(period_ms);
                Ok(Response::silent())
            }
            (Some("interrupt"), 4) if args.get(3) == Some("disable") => {
                let channel = C::GPIO_IRQ_CHANNEL;
                let owner = IrqOwner::Port(port.name);
                irq.unbind_if(channel, |binding| binding.owner == owner)
                    .ok_or(CliError::NotConfigured("No interrupt has been configured."))?;
                Ok(Response::silent())
            }
            (Some("interrupt"), n) if n >= 5 => {
                let route = port.route.ok_or(CliError::InvalidArgument {
                    arg_index: 1,
                    expected: "interrupt-capable port",
                })?;
                let edge = args
                    .get(3)
                    .and_then(Edge::parse)
                    .ok_or(CliError::Usage(USAGE))?;
                let subcommand = extract_subcommand(args, 4)?;

                let binding = IrqBinding {
                    owner: IrqOwner::Port(port.name),
                    route,
                    edge,
                    subcommand,
                };
                irq.try_bind(C::GPIO_IRQ_CHANNEL, binding).map_err(|_| {
                    CliError::AlreadyConfigured(
                        "An interrupt has already been configured. Disable it first with `interrupt disable`.",
                    )
                })?;
                Ok(Response::silent())
            }
            _ => Err(CliError::Usage(USAGE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultConfig;
    use crate::shell::tokenize;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

    extern crate std;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct TestPin {
        level: Rc<Cell<bool>>,
        toggles: Rc<Cell<u32>>,
    }

    impl ErrorType for TestPin {
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

    struct NoController;

    impl InterruptController for NoController {
        fn enable(&mut self, _channel: usize, _route: IrqRoute, _edge: Edge) {}
        fn disable(&mut self, _channel: usize) {}
    }

    async fn run(
        ports: &PortTable<'_, TestPin>,
        irq: &IrqPool<NoController>,
        line: &str,
    ) -> Result<Response, CliError> {
        let args = tokenize(line, 20).unwrap();
        ports.execute::<DefaultConfig, _>(irq, &args).await
    }

    #[tokio::test]
    async fn test_read_write_toggle() {
        let pin = TestPin::default();
        let ports = [Port::new("LED1", pin.clone(), None)];
        let table = PortTable::new(&ports);
        let irq = IrqPool::new(NoController, &[]);

        assert_eq!(run(&table, &irq, "gpio LED1 read").await.unwrap().message.as_str(), "0");
        run(&table, &irq, "gpio LED1 write 1").await.unwrap();
        assert!(pin.level.get());
        assert_eq!(run(&table, &irq, "gpio LED1 read").await.unwrap().message.as_str(), "1");
        run(&table, &irq, "gpio LED1 toggle").await.unwrap();
        assert!(!pin.level.get());
        assert_eq!(pin.toggles.get(), 1);
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let ports = [Port::new("LED1", TestPin::default(), None)];
        let table = PortTable::new(&ports);
        let irq = IrqPool::new(NoController, &[]);

        for line in [
            "gpio",
            "gpio LED1",
            "gpio LED1 write",
            "gpio LED1 write 2",
            "gpio LED1 read now",
            "gpio LED1 blink -1",
            "gpio LED1 flash",
            "gpio LED1 interrupt raising",
        ] {
            assert_eq!(run(&table, &irq, line).await, Err(CliError::Usage(USAGE)), "{}", line);
        }

        assert_eq!(
            run(&table, &irq, "gpio LED9 read").await,
            Err(CliError::InvalidArgument {
                arg_index: 1,
                expected: "port name"
            })
        );
    }

    #[tokio::test]
    async fn test_lock_timeout() {
        let ports = [Port::new("LED1", TestPin::default(), None)];
        let table = PortTable::new(&ports);
        let irq = IrqPool::new(NoController, &[]);

        let _held = ports[0].pin.lock().await;
        assert_eq!(run(&table, &irq, "gpio LED1 toggle").await, Err(CliError::LockTimeout));
    }

    #[tokio::test]
    async fn test_blink_sets_generator() {
        let ports = [Port::new("LED1", TestPin::default(), None)];
        let table = PortTable::new(&ports);
        let irq = IrqPool::new(NoController, &[]);

        run(&table, &irq, "gpio LED1 blink 500").await.unwrap();
        assert_eq!(ports[0].blink_period_ms(), 500);
        run(&table, &irq, "gpio LED1 blink 0").await.unwrap();
        assert_eq!(ports[0].blink_period_ms(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_binding_ownership() {
        let ports = [
            Port::new("TEC1", TestPin::default(), Some(IrqRoute::new(0, 4))),
            Port::new("TEC2", TestPin::default(), Some(IrqRoute::new(0, 8))),
            Port::new("LED1", TestPin::default(), None),
        ];
        let table = PortTable::new(&ports);
        let irq = IrqPool::new(NoController, &[]);

        assert!(matches!(
            run(&table, &irq, "gpio TEC1 interrupt disable").await,
            Err(CliError::NotConfigured(_))
        ));

        run(&table, &irq, "gpio TEC1 interrupt falling echo pressed").await.unwrap();
        let binding = irq.binding(DefaultConfig::GPIO_IRQ_CHANNEL).unwrap();
        assert_eq!(binding.owner, IrqOwner::Port("TEC1"));
        assert_eq!(binding.edge, Edge::Falling);
        assert_eq!(binding.subcommand.as_str(), "echo pressed");

        assert!(matches!(
            run(&table, &irq, "gpio TEC2 interrupt raising echo other").await,
            Err(CliError::AlreadyConfigured(_))
        ));
        // Only the owning port can release the channel
        assert!(matches!(
            run(&table, &irq, "gpio TEC2 interrupt disable").await,
            Err(CliError::NotConfigured(_))
        ));

        run(&table, &irq, "gpio TEC1 interrupt disable").await.unwrap();
        assert!(irq.binding(DefaultConfig::GPIO_IRQ_CHANNEL).is_none());

        assert_eq!(
            run(&table, &irq, "gpio LED1 interrupt raising echo x").await,
            Err(CliError::InvalidArgument {
                arg_index: 1,
                expected: "interrupt-capable port"
            })
        );
    }
}
