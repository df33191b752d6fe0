//! Talk to a Build Brighton badge over its serial link.
//!
//! # Crate Structure
//!
//! - [`transport`]: Device node and socket bridge handles
//! - [`frame`]: Sync-run framing, complement checksum, readers and writers
//!
//! ```no_run
//! use badgelink::frame::{Command, FrameReader, FrameWriter};
//! use badgelink::transport::BadgeStream;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = BadgeStream::open_device("/dev/ttyUSB0")?;
//! let mut writer = FrameWriter::new(stream.try_clone()?);
//! let mut reader = FrameReader::new(stream);
//!
//! writer.send(&Command::new(0x01u8, 0x2A))?;
//! let message = reader.read_message()?;
//! println!("badge says {message}");
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use badgelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use badgelink_frame::*;
}
