use std::fmt;
use std::time::Duration;

use bytes::{BufMut, BytesMut};

/// Sync run: four zero bytes mark the start of every frame.
pub const SYNC: [u8; SYNC_SIZE] = [0x00; SYNC_SIZE];

/// Length of the sync run.
pub const SYNC_SIZE: usize = 4;
/// Length of the big-endian payload field.
pub const PAYLOAD_SIZE: usize = 4;
/// Length of the complement field that follows the payload.
pub const COMPLEMENT_SIZE: usize = 4;

/// Total wire size of a frame: sync (4) + payload (4) + complement (4).
pub const FRAME_SIZE: usize = SYNC_SIZE + PAYLOAD_SIZE + COMPLEMENT_SIZE;

/// Leading bytes of every outbound command payload (`0xBB`, `250`).
pub const COMMAND_PREFIX: [u8; 2] = [0xBB, 0xFA];

/// Value the payload and complement must sum to (mod 2^32).
pub const CHECKSUM_TARGET: u32 = 0xFFFF_FFFF;

/// Default number of bytes requested from the transport per read.
pub const DEFAULT_READ_CHUNK: usize = 256;

/// Bitwise complement of each payload byte, in order.
pub fn complement(payload: [u8; PAYLOAD_SIZE]) -> [u8; COMPLEMENT_SIZE] {
    payload.map(|b| !b)
}

/// Check the frame integrity identity.
///
/// Both fields are read as big-endian `u32` and must sum to `0xFFFFFFFF`
/// with wrapping arithmetic. The bytes themselves are never compared.
pub fn checksum_matches(payload: [u8; PAYLOAD_SIZE], complement: [u8; COMPLEMENT_SIZE]) -> bool {
    u32::from_be_bytes(payload).wrapping_add(u32::from_be_bytes(complement)) == CHECKSUM_TARGET
}

/// An outbound command: a mode code and one data byte.
///
/// The mode enumeration belongs to the caller; anything that converts into a
/// single wire byte can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    /// Wire value of the mode.
    pub mode: u8,
    /// Data byte carried with the mode.
    pub data: u8,
}

impl Command {
    /// Create a new command.
    pub fn new(mode: impl Into<u8>, data: u8) -> Self {
        Self {
            mode: mode.into(),
            data,
        }
    }

    /// The payload field for this command: `[0xBB, 0xFA, mode, data]`.
    pub fn payload(&self) -> [u8; PAYLOAD_SIZE] {
        [COMMAND_PREFIX[0], COMMAND_PREFIX[1], self.mode, self.data]
    }

    /// The full 12-byte wire frame for this command.
    pub fn to_frame(&self) -> [u8; FRAME_SIZE] {
        encode(self.mode, self.data)
    }
}

/// A validated 4-byte payload received from the badge.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Message([u8; PAYLOAD_SIZE]);

impl Message {
    pub(crate) fn new(payload: [u8; PAYLOAD_SIZE]) -> Self {
        Self(payload)
    }

    /// The raw payload bytes.
    pub fn as_bytes(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.0
    }

    /// Consume the message and return the payload bytes.
    pub fn into_bytes(self) -> [u8; PAYLOAD_SIZE] {
        self.0
    }

    /// The payload read as a big-endian `u32`.
    pub fn value(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Interpret the payload as a command when it carries the `BB FA` prefix.
    pub fn as_command(&self) -> Option<Command> {
        match self.0 {
            [0xBB, 0xFA, mode, data] => Some(Command { mode, data }),
            _ => None,
        }
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({:08x})", self.value())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.value())
    }
}

/// Encode a command into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────────┬──────────────────────────┬────────────────────────┐
/// │ Sync (4B)       │ Payload (4B BE)          │ Complement (4B)        │
/// │ 00 00 00 00     │ BB FA <mode> <data>      │ !payload[i] per byte   │
/// └─────────────────┴──────────────────────────┴────────────────────────┘
/// ```
pub fn encode(mode: u8, data: u8) -> [u8; FRAME_SIZE] {
    let payload = [COMMAND_PREFIX[0], COMMAND_PREFIX[1], mode, data];
    let inverted = complement(payload);

    let mut frame = [0u8; FRAME_SIZE];
    frame[SYNC_SIZE..SYNC_SIZE + PAYLOAD_SIZE].copy_from_slice(&payload);
    frame[SYNC_SIZE + PAYLOAD_SIZE..].copy_from_slice(&inverted);
    frame
}

/// Append the encoded frame for `command` to `dst`.
pub fn encode_into(command: &Command, dst: &mut BytesMut) {
    dst.reserve(FRAME_SIZE);
    dst.put_slice(&command.to_frame());
}

/// How a frame is handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    /// One write of all 12 bytes.
    #[default]
    Combined,
    /// Three writes: sync, payload, complement.
    PerField,
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Bytes requested from the transport per read. Default: 256.
    pub read_chunk_size: usize,
    /// Read timeout for blocking transports.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking transports.
    pub write_timeout: Option<Duration>,
    /// How frames are split into transport writes.
    pub write_strategy: WriteStrategy,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK,
            read_timeout: None,
            write_timeout: None,
            write_strategy: WriteStrategy::Combined,
        }
    }
}
