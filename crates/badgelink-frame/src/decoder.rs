use tracing::{debug, trace, warn};

use crate::codec::{checksum_matches, Message, COMPLEMENT_SIZE, PAYLOAD_SIZE, SYNC_SIZE};

/// Receives validated messages as the decoder completes them.
///
/// Invoked synchronously from inside [`FrameDecoder::feed_chunk`], in frame
/// completion order.
pub trait MessageSink {
    fn deliver(&mut self, message: Message);
}

impl<F> MessageSink for F
where
    F: FnMut(Message),
{
    fn deliver(&mut self, message: Message) {
        self(message)
    }
}

/// Position within the current frame attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Counting consecutive zero bytes of the sync run.
    Seeking { zeros: usize },
    /// Collecting payload bytes.
    Payload {
        payload: [u8; PAYLOAD_SIZE],
        filled: usize,
    },
    /// Collecting complement bytes; the payload is complete.
    Complement {
        payload: [u8; PAYLOAD_SIZE],
        complement: [u8; COMPLEMENT_SIZE],
        filled: usize,
    },
}

impl Phase {
    const START: Phase = Phase::Seeking { zeros: 0 };
}

/// Counters describing what the decoder has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames that passed the checksum and were emitted.
    pub messages: u64,
    /// Frames discarded because the checksum identity failed.
    pub checksum_mismatches: u64,
    /// Partial sync runs broken by a non-zero byte.
    pub sync_resets: u64,
    /// Explicit resets, including those after a stream fault.
    pub resets: u64,
}

/// Streaming decoder for sync-run frames.
///
/// Bytes go in one at a time, strictly in arrival order. A frame is four
/// `0x00` sync bytes, four payload bytes and four complement bytes; only
/// frames whose payload and complement sum to `0xFFFFFFFF` produce a
/// [`Message`]. There is no length field and no escaping, so a stream whose
/// payload bytes contain a run of zeros can knock the decoder out of step
/// until the next genuine sync run.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    phase: Phase,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder waiting for a sync run.
    pub fn new() -> Self {
        Self {
            phase: Phase::START,
            stats: DecoderStats::default(),
        }
    }

    /// Consume one byte, returning a message when it completes a valid frame.
    pub fn feed(&mut self, byte: u8) -> Option<Message> {
        trace!(byte, progress = self.progress(), "got byte");

        let phase = self.phase;
        let (next, message) = match phase {
            Phase::Seeking { zeros } if byte != 0x00 => {
                if zeros > 0 {
                    trace!(zeros, byte, "sync run broken");
                    self.stats.sync_resets += 1;
                }
                (Phase::START, None)
            }
            Phase::Seeking { zeros } if zeros + 1 == SYNC_SIZE => (
                Phase::Payload {
                    payload: [0; PAYLOAD_SIZE],
                    filled: 0,
                },
                None,
            ),
            Phase::Seeking { zeros } => (Phase::Seeking { zeros: zeros + 1 }, None),
            Phase::Payload {
                mut payload,
                filled,
            } => {
                payload[filled] = byte;
                if filled + 1 == PAYLOAD_SIZE {
                    (
                        Phase::Complement {
                            payload,
                            complement: [0; COMPLEMENT_SIZE],
                            filled: 0,
                        },
                        None,
                    )
                } else {
                    (
                        Phase::Payload {
                            payload,
                            filled: filled + 1,
                        },
                        None,
                    )
                }
            }
            Phase::Complement {
                payload,
                mut complement,
                filled,
            } => {
                complement[filled] = byte;
                if filled + 1 == COMPLEMENT_SIZE {
                    (Phase::START, self.complete(payload, complement))
                } else {
                    (
                        Phase::Complement {
                            payload,
                            complement,
                            filled: filled + 1,
                        },
                        None,
                    )
                }
            }
        };

        self.phase = next;
        message
    }

    /// Feed a chunk of any length, delivering each completed message to `sink`.
    ///
    /// Returns the number of messages delivered.
    pub fn feed_chunk<S>(&mut self, chunk: &[u8], sink: &mut S) -> usize
    where
        S: MessageSink + ?Sized,
    {
        let mut delivered = 0;
        for &byte in chunk {
            if let Some(message) = self.feed(byte) {
                sink.deliver(message);
                delivered += 1;
            }
        }
        delivered
    }

    /// Drop any partial frame and go back to seeking a sync run.
    pub fn reset(&mut self) {
        if self.phase != Phase::START {
            debug!(progress = self.progress(), "discarding partial frame");
        }
        self.phase = Phase::START;
        self.stats.resets += 1;
    }

    /// Position within the current frame attempt, in `0..=11`.
    pub fn progress(&self) -> usize {
        match self.phase {
            Phase::Seeking { zeros } => zeros,
            Phase::Payload { filled, .. } => SYNC_SIZE + filled,
            Phase::Complement { filled, .. } => SYNC_SIZE + PAYLOAD_SIZE + filled,
        }
    }

    /// True when no partial frame is held.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::START
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn complete(
        &mut self,
        payload: [u8; PAYLOAD_SIZE],
        complement: [u8; COMPLEMENT_SIZE],
    ) -> Option<Message> {
        let msg = u32::from_be_bytes(payload);
        let inv = u32::from_be_bytes(complement);

        if checksum_matches(payload, complement) {
            debug!(payload = format_args!("{msg:08x}"), "got message");
            self.stats.messages += 1;
            Some(Message::new(payload))
        } else {
            warn!(
                payload = format_args!("{msg:08x}"),
                complement = format_args!("{inv:08x}"),
                "message had bad checksum"
            );
            self.stats.checksum_mismatches += 1;
            None
        }
    }
}
