use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use badgelink_transport::BadgeStream;
use tracing::{debug, error};

use crate::codec::{FrameConfig, Message};
use crate::decoder::{DecoderStats, FrameDecoder, MessageSink};
use crate::error::{FrameError, Result};

/// Reads validated messages from any `Read` stream.
///
/// Chunks of any size are fed through a [`FrameDecoder`]; frames may straddle
/// reads freely. Bad checksums and sync noise are absorbed, so callers only
/// ever see good messages or transport errors.
pub struct FrameReader<T> {
    inner: T,
    decoder: FrameDecoder,
    pending: VecDeque<Message>,
    buf: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            buf: vec![0u8; config.read_chunk_size.max(1)],
            config,
        }
    }

    /// Read the next validated message (blocking).
    ///
    /// Messages completed by the same chunk are queued and returned in
    /// order. Returns `Err(FrameError::ConnectionClosed)` at end of stream.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(message);
            }

            let read = self.read_chunk()?;
            let pending = &mut self.pending;
            self.decoder
                .feed_chunk(&self.buf[..read], &mut |m| pending.push_back(m));
        }
    }

    /// Deliver every message to `sink` until the stream ends.
    ///
    /// Messages are handed over from inside the feeding loop, as soon as
    /// their final byte is seen. End of stream returns `Ok(())`.
    pub fn run<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        while let Some(message) = self.pending.pop_front() {
            sink.deliver(message);
        }

        loop {
            let read = match self.read_chunk() {
                Ok(n) => n,
                Err(FrameError::ConnectionClosed) => return Ok(()),
                Err(err) => return Err(err),
            };
            self.decoder.feed_chunk(&self.buf[..read], sink);
        }
    }

    /// Read one chunk into the scratch buffer.
    ///
    /// `WouldBlock` and `TimedOut` leave the decoder where it is so the caller
    /// can retry. Any other failure throws away the partial frame.
    fn read_chunk(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => {
                    debug!(progress = self.decoder.progress(), "end of stream");
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Err(FrameError::Io(err));
                }
                Err(err) => {
                    error!(
                        progress = self.decoder.progress(),
                        error = %err,
                        "stream fault, resetting frame state"
                    );
                    self.decoder.reset();
                    return Err(FrameError::Io(err));
                }
            }
        }
    }

    /// Drop any partial frame and queued messages.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.decoder.reset();
    }

    /// Decoder position within the current frame attempt.
    pub fn progress(&self) -> usize {
        self.decoder.progress()
    }

    /// Counters from the underlying decoder.
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<BadgeStream> {
    /// Create a frame reader for `BadgeStream` and apply read timeout from config.
    pub fn with_config_stream(inner: BadgeStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: badgelink_transport::TransportError) -> FrameError {
    match err {
        badgelink_transport::TransportError::Io(io) => FrameError::Io(io),
        badgelink_transport::TransportError::Open { source, .. }
        | badgelink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
