/// Errors that can occur while moving frames over a transport.
///
/// Sync loss and checksum mismatches are not errors: the decoder absorbs
/// them and keeps scanning.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport reached end of stream.
    #[error("connection closed")]
    ConnectionClosed,

    /// A hex dump could not be parsed into bytes.
    #[error("invalid hex byte {token:?}")]
    InvalidHex { token: String },
}

pub type Result<T> = std::result::Result<T, FrameError>;

impl FrameError {
    /// True when the transport timed out or would block; the decoder keeps
    /// its partial frame and the read can be retried.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err)
                if matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
        )
    }
}
