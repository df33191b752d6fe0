//! Byte-stream handles for talking to a badge.
//!
//! A [`BadgeStream`] is either an already configured serial device node or a
//! Unix socket bridge (a pty relay or a badge simulator). Finding the device
//! and setting its line parameters (9600 baud, 8N1 for the badge) is left to
//! the operator; this crate only opens what it is pointed at.

pub mod error;
pub mod stream;

pub use error::{Result, TransportError};
pub use stream::{BadgeStream, StreamKind};
