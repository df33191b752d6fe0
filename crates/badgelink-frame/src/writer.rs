use std::io::{ErrorKind, Write};

use badgelink_transport::BadgeStream;
use bytes::BytesMut;
use tracing::debug;

use crate::codec::{
    encode_into, Command, FrameConfig, WriteStrategy, FRAME_SIZE, PAYLOAD_SIZE, SYNC_SIZE,
};
use crate::error::{FrameError, Result};
use crate::hex::to_hex;
use crate::reader::transport_to_frame_error;

/// Writes command frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(FRAME_SIZE),
            config,
        }
    }

    /// Encode and send one command frame (blocking).
    pub fn send(&mut self, command: &Command) -> Result<()> {
        self.buf.clear();
        encode_into(command, &mut self.buf);

        debug!(
            payload = %to_hex(&self.buf[SYNC_SIZE..SYNC_SIZE + PAYLOAD_SIZE]),
            complement = %to_hex(&self.buf[SYNC_SIZE + PAYLOAD_SIZE..]),
            "writing frame"
        );

        let frame = self.buf.split().freeze();
        match self.config.write_strategy {
            WriteStrategy::Combined => self.write_all(&frame)?,
            WriteStrategy::PerField => {
                self.write_all(&frame[..SYNC_SIZE])?;
                self.write_all(&frame[SYNC_SIZE..SYNC_SIZE + PAYLOAD_SIZE])?;
                self.write_all(&frame[SYNC_SIZE + PAYLOAD_SIZE..])?;
            }
        }

        self.flush()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Change how subsequent frames are split into writes.
    pub fn set_write_strategy(&mut self, strategy: WriteStrategy) {
        self.config.write_strategy = strategy;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<BadgeStream> {
    /// Create a frame writer for `BadgeStream` and apply write timeout from config.
    pub fn with_config_stream(inner: BadgeStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::encode;
    use crate::decoder::FrameDecoder;

    #[test]
    fn write_single_frame() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        writer.send(&Command::new(0x01u8, 0x2A)).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(
            wire,
            vec![0x00, 0x00, 0x00, 0x00, 0xBB, 0xFA, 0x01, 0x2A, 0x44, 0x05, 0xFE, 0xD5]
        );
    }

    #[test]
    fn write_multiple_frames_decode_in_order() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        writer.send(&Command::new(1u8, 10)).unwrap();
        writer.send(&Command::new(2u8, 20)).unwrap();
        writer.send(&Command::new(3u8, 30)).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut decoder = FrameDecoder::new();
        let mut seen = Vec::new();
        decoder.feed_chunk(&wire, &mut |m: crate::Message| seen.push(m.as_command()));

        assert_eq!(
            seen,
            vec![
                Some(Command::new(1u8, 10)),
                Some(Command::new(2u8, 20)),
                Some(Command::new(3u8, 30)),
            ]
        );
    }

    #[test]
    fn per_field_strategy_uses_three_writes() {
        let cfg = FrameConfig {
            write_strategy: WriteStrategy::PerField,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(RecordingWriter::default(), cfg);

        writer.send(&Command::new(0x01u8, 0x2A)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.writes.len(), 3);
        assert_eq!(inner.writes[0], vec![0x00; 4]);
        assert_eq!(inner.writes[1], vec![0xBB, 0xFA, 0x01, 0x2A]);
        assert_eq!(inner.writes[2], vec![0x44, 0x05, 0xFE, 0xD5]);
    }

    #[test]
    fn strategies_produce_identical_bytes() {
        let mut combined = FrameWriter::new(RecordingWriter::default());
        let mut split = FrameWriter::new(RecordingWriter::default());
        split.set_write_strategy(WriteStrategy::PerField);

        combined.send(&Command::new(9u8, 99)).unwrap();
        split.send(&Command::new(9u8, 99)).unwrap();

        let combined = combined.into_inner();
        let split = split.into_inner();
        assert_eq!(combined.writes.len(), 1);
        assert_eq!(combined.writes.concat(), split.writes.concat());
        assert_eq!(split.writes.concat(), encode(9, 99).to_vec());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(&Command::new(1u8, 1)).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        assert_eq!(writer.config().write_strategy, WriteStrategy::Combined);
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = FlakyWriter::new(ErrorKind::Interrupted);

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(&Command::new(5u8, 5)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, encode(5, 5).to_vec());
    }

    #[test]
    fn handles_would_block_write_and_flush() {
        let writer_impl = FlakyWriter::new(ErrorKind::WouldBlock);

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(&Command::new(6u8, 6)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, encode(6, 6).to_vec());
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(&Command::new(1u8, 1)).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn other_write_errors_propagate() {
        let mut writer = FrameWriter::new(FlakyWriter::new(ErrorKind::BrokenPipe));
        let err = writer.send(&Command::new(1u8, 1)).unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<Vec<u8>>,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails the first write and the first flush with `kind`, then succeeds.
    struct FlakyWriter {
        kind: ErrorKind,
        wrote_once: bool,
        flushed_once: bool,
        data: Vec<u8>,
    }

    impl FlakyWriter {
        fn new(kind: ErrorKind) -> Self {
            Self {
                kind,
                wrote_once: false,
                flushed_once: false,
                data: Vec::new(),
            }
        }
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(self.kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flushed_once {
                self.flushed_once = true;
                return Err(std::io::Error::from(self.kind));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
