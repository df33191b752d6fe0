use std::path::PathBuf;

/// Errors that can occur opening or using a badge stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device node.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the socket bridge.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation is not available for this kind of stream.
    #[error("{operation} is not supported on {kind} streams")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
