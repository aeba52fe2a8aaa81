use clap::{Args, Subcommand};
use std::path::PathBuf;

use reflecta_transport::{SerialConfig, SerialPort, DEFAULT_BAUD_RATE};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a payload and print the wire bytes.
    Encode(EncodeArgs),
    /// Decode wire bytes and print frames and violations.
    Decode(DecodeArgs),
    /// Send a single frame over a serial device.
    Send(SendArgs),
    /// Listen and print received frames.
    Listen(ListenArgs),
    /// Send every received frame back to the peer.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where a payload comes from. Exactly one source may be given.
#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex payload (e.g. "01 c0 02" or "01c002").
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    /// Resolve to bytes; no source at all is an empty payload.
    pub fn resolve(&self) -> CliResult<Vec<u8>> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(hex) = &self.hex {
            return parse_hex(hex);
        }
        if let Some(path) = &self.file {
            return std::fs::read(path).map_err(|err| {
                crate::exit::io_error(&format!("failed reading {}", path.display()), err)
            });
        }
        Ok(Vec::new())
    }
}

/// Serial device selection shared by the commands that open one.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device path.
    #[arg(env = "REFLECTA_DEVICE")]
    pub device: PathBuf,
    /// Line speed in bits per second.
    #[arg(long, env = "REFLECTA_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

impl DeviceArgs {
    pub fn open(&self) -> CliResult<SerialPort> {
        let config = SerialConfig {
            baud_rate: self.baud,
            ..SerialConfig::default()
        };
        SerialPort::open(&self.device, &config)
            .map_err(|err| transport_error("open failed", err))
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Sequence number to stamp on the frame.
    #[arg(long, short = 's', default_value_t = 0)]
    pub sequence: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex wire bytes.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read wire bytes from file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Receive buffer capacity (payload plus checksum byte).
    #[arg(long, default_value_t = reflecta_frame::DEFAULT_BUFFER_CAPACITY)]
    pub capacity: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex bytes, ignoring whitespace, commas and `0x` prefixes.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|tok| tok.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("hex input has an odd number of digits: {input}"),
        ));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex input: {input}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_common_spellings() {
        assert_eq!(parse_hex("05 db dc 02").unwrap(), vec![0x05, 0xDB, 0xDC, 0x02]);
        assert_eq!(parse_hex("05dbdc02").unwrap(), vec![0x05, 0xDB, 0xDC, 0x02]);
        assert_eq!(parse_hex("0x05,0xC0").unwrap(), vec![0x05, 0xC0]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("é1").is_err());
    }

    #[test]
    fn payload_defaults_to_empty() {
        assert!(PayloadArgs::default().resolve().unwrap().is_empty());
    }
}
