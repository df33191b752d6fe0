//! `tokio_util::codec` adapter for async transports.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_into, Command, Message};
use crate::decoder::{DecoderStats, FrameDecoder};
use crate::error::FrameError;

/// Codec yielding validated [`Message`]s and accepting [`Command`]s.
///
/// Decoding consumes bytes up to and including the end of each good frame;
/// partial frames stay inside the decoder, not in the read buffer.
#[derive(Debug, Clone, Default)]
pub struct BadgeCodec {
    decoder: FrameDecoder,
}

impl BadgeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder position within the current frame attempt.
    pub fn progress(&self) -> usize {
        self.decoder.progress()
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }
}

impl Decoder for BadgeCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut message = None;
        let end = src.iter().position(|&byte| {
            message = self.decoder.feed(byte);
            message.is_some()
        });

        match end {
            Some(pos) => src.advance(pos + 1),
            None => src.clear(),
        }
        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A trailing partial frame is dropped silently; there is nothing to recover.
        self.decode(src)
    }
}

impl Encoder<Command> for BadgeCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(&item, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::encode;

    #[test]
    fn decode_leaves_bytes_after_frame() {
        let mut codec = BadgeCodec::new();
        let mut buf = BytesMut::from(&encode(1, 2)[..]);
        buf.extend_from_slice(&encode(3, 4)[..5]);

        let message = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.as_bytes(), &[0xBB, 0xFA, 1, 2]);
        assert_eq!(buf.len(), 5);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
        assert_eq!(codec.progress(), 5);
    }

    #[tokio::test]
    async fn framed_read_yields_messages() {
        let mut wire = vec![0xAA, 0x55];
        wire.extend_from_slice(&encode(1, 1));
        wire.extend_from_slice(&encode(2, 2));

        let mut framed = FramedRead::new(&wire[..], BadgeCodec::new());
        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();

        assert_eq!(first.as_command(), Some(Command::new(1u8, 1)));
        assert_eq!(second.as_command(), Some(Command::new(2u8, 2)));
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_write_emits_wire_frames() {
        let mut framed = FramedWrite::new(Vec::new(), BadgeCodec::new());
        framed.send(Command::new(0x01u8, 0x2A)).await.unwrap();

        assert_eq!(
            framed.get_ref().as_slice(),
            &[0x00, 0x00, 0x00, 0x00, 0xBB, 0xFA, 0x01, 0x2A, 0x44, 0x05, 0xFE, 0xD5]
        );
    }

    #[tokio::test]
    async fn duplex_roundtrip() {
        let (client, server) = tokio::io::duplex(64);
        let mut tx = FramedWrite::new(client, BadgeCodec::new());
        let mut rx = FramedRead::new(server, BadgeCodec::new());

        // Ten frames overflow the 64-byte pipe, so the writer runs on its own task.
        let writer = tokio::spawn(async move {
            for i in 0..10u8 {
                tx.send(Command::new(i, i.wrapping_mul(3))).await.unwrap();
            }
        });

        let mut seen = Vec::new();
        while let Some(message) = rx.next().await {
            seen.push(message.unwrap().as_bytes()[2]);
        }
        writer.await.unwrap();
        assert_eq!(seen, (0..10u8).collect::<Vec<_>>());
    }
}
