use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Which kind of handle backs a [`BadgeStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// A character device such as `/dev/ttyUSB0` or `COM3`.
    Device,
    /// A Unix domain socket bridge.
    Unix,
}

impl StreamKind {
    /// Name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Device => "device",
            StreamKind::Unix => "unix-socket",
        }
    }
}

/// A connected badge link. Implements `Read` and `Write`.
pub struct BadgeStream {
    inner: BadgeStreamInner,
}

enum BadgeStreamInner {
    Device(File),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for BadgeStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BadgeStreamInner::Device(file) => file.read(buf),
            #[cfg(unix)]
            BadgeStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for BadgeStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BadgeStreamInner::Device(file) => file.write(buf),
            #[cfg(unix)]
            BadgeStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            BadgeStreamInner::Device(file) => file.flush(),
            #[cfg(unix)]
            BadgeStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl BadgeStream {
    /// Open a device node for reading and writing.
    ///
    /// The line must already be configured; nothing here touches termios.
    pub fn open_device(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TransportError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(?path, "opened badge device");
        Ok(Self {
            inner: BadgeStreamInner::Device(file),
        })
    }

    /// Connect to a Unix socket bridge (blocking).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(?path, "connected to badge socket bridge");
        Ok(Self {
            inner: BadgeStreamInner::Unix(stream),
        })
    }

    /// Which kind of handle backs this stream.
    pub fn kind(&self) -> StreamKind {
        match &self.inner {
            BadgeStreamInner::Device(_) => StreamKind::Device,
            #[cfg(unix)]
            BadgeStreamInner::Unix(_) => StreamKind::Unix,
        }
    }

    /// Set read timeout on the underlying stream.
    ///
    /// Device nodes only accept `None`; their timeouts belong to the line
    /// configuration.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            BadgeStreamInner::Device(_) => unsupported_timeout(timeout, "read timeout"),
            #[cfg(unix)]
            BadgeStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            BadgeStreamInner::Device(_) => unsupported_timeout(timeout, "write timeout"),
            #[cfg(unix)]
            BadgeStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Used to give the reader and the writer their own handle.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            BadgeStreamInner::Device(file) => BadgeStreamInner::Device(file.try_clone()?),
            #[cfg(unix)]
            BadgeStreamInner::Unix(stream) => BadgeStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self { inner })
    }
}

fn unsupported_timeout(timeout: Option<Duration>, operation: &'static str) -> Result<()> {
    match timeout {
        None => Ok(()),
        Some(_) => Err(TransportError::Unsupported {
            operation,
            kind: StreamKind::Device.name(),
        }),
    }
}

impl std::fmt::Debug for BadgeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeStream")
            .field("type", &self.kind().name())
            .finish()
    }
}
