//! Framing for the badge serial link.
//!
//! Every frame on the wire is exactly 12 bytes:
//! - 4 sync bytes, all `0x00`
//! - a 4-byte payload (`BB FA <mode> <data>` for commands sent to the badge)
//! - a 4-byte complement, each payload byte inverted
//!
//! A frame is accepted when payload and complement, read as big-endian
//! `u32`s, sum to `0xFFFFFFFF`. There is no length field; the decoder is a
//! purely positional state machine that resynchronizes on the next sync run.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod hex;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::BadgeCodec;
pub use codec::{
    checksum_matches, complement, encode, encode_into, Command, FrameConfig, Message,
    WriteStrategy, COMMAND_PREFIX, FRAME_SIZE, PAYLOAD_SIZE, SYNC,
};
pub use decoder::{DecoderStats, FrameDecoder, MessageSink};
pub use error::{FrameError, Result};
pub use hex::{parse_hex, to_hex};
pub use reader::FrameReader;
pub use writer::FrameWriter;
