//! I2C bus and the `i2c` command.
//!
//! Payloads are written as colon-separated hex pairs (`aa:bb:cc`) and read
//! data is printed the same way. Nothing touches the bus before
//! `i2c init <freq>` has set a non-zero frequency.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::i2c::Error as _;

use crate::config::{I2C_MAX_TRANSFER, ShellConfig};
use crate::error::CliError;
use crate::hal::I2cBus;
use crate::registry::{CommandKind, CommandMeta};
use crate::response::Response;
use crate::shell::Args;

/// `i2c` command metadata.
pub const CMD_I2C: CommandMeta = CommandMeta {
    name: "i2c",
    description: "Control the I2C port",
    kind: CommandKind::Handler,
};

const USAGE: &str = "Usage:\r\n\
    \x20 i2c init <freq_hz>\r\n\
    \x20 i2c slave <addr> write <aa:bb:..>\r\n\
    \x20 i2c slave <addr> read <len>\r\n\
    \x20 i2c slave <addr> write <aa:bb:..> read <len> [stop|nostop]\r\n\
    Examples:\r\n\
    \x20 i2c init 100000\r\n\
    \x20 i2c slave 68 write 75 read 1 nostop\r\n";

const NOT_INITIALIZED: &str = "i2c init must be called first";

/// Byte buffer for one transfer.
pub type Payload = heapless::Vec<u8, I2C_MAX_TRANSFER>;

struct I2cState<B> {
    bus: B,
    frequency_hz: Option<u32>,
}

/// The board's I2C bus plus its configured frequency.
pub struct I2cPort<B: I2cBus> {
    state: Mutex<CriticalSectionRawMutex, I2cState<B>>,
}

impl<B: I2cBus> I2cPort<B> {
    /// Wrap an unconfigured bus.
    pub const fn new(bus: B) -> Self {
        Self {
            state: Mutex::new(I2cState {
                bus,
                frequency_hz: None,
            }),
        }
    }

    /// Frequency set by the last `i2c init`, if any.
    pub async fn frequency_hz(&self) -> Option<u32> {
        self.state.lock().await.frequency_hz
    }

    /// `i2c ...`
    pub async fn execute<C: ShellConfig>(&self, args: &Args<'_>) -> Result<Response, CliError> {
        let mut state = self.state.lock().await;

        if args.get(1) == Some("init") {
            let hz = match (args.len(), args.get(2).map(str::parse::<u32>)) {
                (3, Some(Ok(hz))) if hz <= C::I2C_MAX_FREQUENCY_HZ => hz,
                _ => return Err(CliError::Usage(USAGE)),
            };
            if hz == 0 {
                state.frequency_hz = None;
                return Ok(Response::silent());
            }
            state.bus.set_frequency(hz).map_err(|e| CliError::Bus(e.kind()))?;
            state.frequency_hz = Some(hz);
            info!("i2c bus at {} Hz", hz);
            return Ok(Response::silent());
        }

        if state.frequency_hz.is_none() {
            return Err(CliError::NotInitialized(NOT_INITIALIZED));
        }

        if args.get(1) != Some("slave") || args.len() < 5 {
            return Err(CliError::Usage(USAGE));
        }
        let address = args.get(2).and_then(parse_address).ok_or(CliError::InvalidArgument {
            arg_index: 2,
            expected: "7-bit address as two hex digits",
        })?;

        match (args.get(3), args.len()) {
            (Some("write"), 5) => {
                let data = parse_payload(args, 4)?;
                state.bus.write(address, &data).map_err(|e| CliError::Bus(e.kind()))?;
                Ok(Response::silent())
            }
            (Some("read"), 5) => {
                let mut buffer = read_buffer(args, 4)?;
                state.bus.read(address, &mut buffer).map_err(|e| CliError::Bus(e.kind()))?;
                format_payload(&buffer)
            }
            (Some("write"), 7 | 8) if args.get(5) == Some("read") => {
                let data = parse_payload(args, 4)?;
                let mut buffer = read_buffer(args, 6)?;
                let stop = match args.get(7) {
                    None | Some("stop") => true,
                    Some("nostop") => false,
                    Some(_) => return Err(CliError::Usage(USAGE)),
                };

                if stop {
                    state.bus.write(address, &data).map_err(|e| CliError::Bus(e.kind()))?;
                    state.bus.read(address, &mut buffer).map_err(|e| CliError::Bus(e.kind()))?;
                } else {
                    state
                        .bus
                        .write_read(address, &data, &mut buffer)
                        .map_err(|e| CliError::Bus(e.kind()))?;
                }
                format_payload(&buffer)
            }
            _ => Err(CliError::Usage(USAGE)),
        }
    }
}

impl<B: I2cBus> core::fmt::Debug for I2cPort<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("I2cPort").finish_non_exhaustive()
    }
}

/// Exactly two hex digits, at most `0x7f`.
pub fn parse_address(token: &str) -> Option<u8> {
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(token, 16).ok().filter(|&address| address <= 0x7f)
}

/// Parse `aa:bb:cc` into bytes.
pub fn parse_hex(token: &str) -> Option<Payload> {
    let mut bytes = Payload::new();
    for pair in token.split(':') {
        if pair.len() != 2 || !pair.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        bytes.push(u8::from_str_radix(pair, 16).ok()?).ok()?;
    }
    Some(bytes)
}

fn parse_payload(args: &Args<'_>, index: usize) -> Result<Payload, CliError> {
    args.get(index).and_then(parse_hex).ok_or(CliError::InvalidArgument {
        arg_index: index,
        expected: "hex bytes like aa:bb:cc (at most 32)",
    })
}

/// Zeroed buffer of the length given at `index`.
fn read_buffer(args: &Args<'_>, index: usize) -> Result<Payload, CliError> {
    let len = args
        .get(index)
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|len| (1..=I2C_MAX_TRANSFER).contains(len))
        .ok_or(CliError::InvalidArgument {
            arg_index: index,
            expected: "length 1-32",
        })?;

    let mut buffer = Payload::new();
    buffer.resize(len, 0).map_err(|_| CliError::BufferFull)?;
    Ok(buffer)
}

fn format_payload(bytes: &[u8]) -> Result<Response, CliError> {
    let mut response = Response::success("");
    for (i, byte) in bytes.iter().enumerate() {
        let separator = if i > 0 { ":" } else { "" };
        write!(response.message, "{}{:02x}", separator, byte).map_err(|_| CliError::BufferFull)?;
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("68"), Some(0x68));
        assert_eq!(parse_address("7f"), Some(0x7f));
        assert_eq!(parse_address("7F"), Some(0x7f));
        assert_eq!(parse_address("80"), None);
        assert_eq!(parse_address("8"), None);
        assert_eq!(parse_address("068"), None);
        assert_eq!(parse_address("+8"), None);
        assert_eq!(parse_address("zz"), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("aa:bb:0c").unwrap().as_slice(), &[0xaa, 0xbb, 0x0c]);
        assert_eq!(parse_hex("ff").unwrap().as_slice(), &[0xff]);
        assert!(parse_hex("").is_none());
        assert!(parse_hex("a:bb").is_none());
        assert!(parse_hex("aab:bb").is_none());
        assert!(parse_hex("aa::bb").is_none());
        assert!(parse_hex("aa:bb:").is_none());
        assert!(parse_hex("gg").is_none());
    }

    #[test]
    fn test_parse_hex_limit() {
        let mut token = heapless::String::<128>::new();
        for i in 0..I2C_MAX_TRANSFER {
            if i > 0 {
                token.push(':').unwrap();
            }
            token.push_str("00").unwrap();
        }
        assert_eq!(parse_hex(&token).unwrap().len(), I2C_MAX_TRANSFER);

        token.push_str(":00").unwrap();
        assert!(parse_hex(&token).is_none());
    }

    #[test]
    fn test_format_payload() {
        let response = format_payload(&[0x01, 0xab, 0x00]).unwrap();
        assert_eq!(response.message.as_str(), "01:ab:00");
    }
}
