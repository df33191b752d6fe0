use std::path::PathBuf;

use badgelink_transport::BadgeStream;
use clap::{Args, Subcommand};

use crate::exit::{transport_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

/// Default device node for the badge's USB serial adapter.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print validated messages received from the badge.
    Listen(ListenArgs),
    /// Send a single command frame to the badge.
    Send(SendArgs),
    /// Print the wire frame for a command without sending it.
    Encode(EncodeArgs),
    /// Decode a captured hex dump and print the messages it contains.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the badge is attached.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial device node. The line must already be set to 9600 8N1.
    #[arg(long, short = 'd', env = "BADGELINK_DEVICE", default_value = DEFAULT_DEVICE)]
    pub device: PathBuf,
    /// Unix socket bridge to use instead of the device node.
    #[arg(long, env = "BADGELINK_UNIX", value_name = "PATH")]
    pub unix: Option<PathBuf>,
}

impl LinkArgs {
    pub fn open(&self) -> CliResult<BadgeStream> {
        #[cfg(unix)]
        if let Some(path) = &self.unix {
            return BadgeStream::connect_unix(path)
                .map_err(|err| transport_error("connect failed", err));
        }

        BadgeStream::open_device(&self.device).map_err(|err| transport_error("open failed", err))
    }
}

/// Mode and data bytes of a command.
#[derive(Args, Debug, Clone, Copy)]
pub struct CommandArgs {
    /// Mode code (decimal or 0x-prefixed hex).
    #[arg(long, short = 'm', value_parser = parse_byte)]
    pub mode: u8,
    /// Data byte (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_byte, default_value = "0")]
    pub data: u8,
}

impl CommandArgs {
    pub fn to_command(self) -> badgelink_frame::Command {
        badgelink_frame::Command::new(self.mode, self.data)
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub command: CommandArgs,
    /// Write sync, payload and complement as three separate writes.
    #[arg(long)]
    pub split_writes: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub command: CommandArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex bytes to decode. Reads stdin when omitted.
    pub hex: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a byte given as decimal (`42`) or hex (`0x2A`).
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse::<u8>(),
    };
    parsed.map_err(|_| format!("expected a byte (0-255 or 0x00-0xFF), got {input:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_byte_decimal_and_hex() {
        assert_eq!(parse_byte("42"), Ok(42));
        assert_eq!(parse_byte("0x2A"), Ok(0x2A));
        assert_eq!(parse_byte("0XfF"), Ok(0xFF));
        assert_eq!(parse_byte(" 7 "), Ok(7));
    }

    #[test]
    fn parse_byte_rejects_out_of_range() {
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("0x100").is_err());
        assert!(parse_byte("-1").is_err());
        assert!(parse_byte("").is_err());
    }

    #[test]
    fn command_args_build_command() {
        let args = CommandArgs {
            mode: 0x01,
            data: 0x2A,
        };
        assert_eq!(
            args.to_command().to_frame(),
            badgelink_frame::encode(0x01, 0x2A)
        );
    }
}
