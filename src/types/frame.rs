//! Frame packets decoded from the preview stream

use std::sync::Arc;

/// Size of the little-endian length prefix on every frame datagram.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Why a datagram could not be decoded into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Fewer than four bytes, so no length prefix
    Truncated { len: usize },
    /// The prefix encodes a negative length
    NegativeLength { declared: i32 },
    /// The prefix claims more bytes than the datagram carries
    LengthOverrun { declared: usize, available: usize },
}

/// One encoded image received from the capture server.
///
/// Handed to exactly one consumer and then dropped; nothing retains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePacket {
    /// Encoded image payload (JPEG from the reference server)
    pub data: Arc<[u8]>,

    /// Receive order assigned by the ingestion loop
    pub sequence: u64,
}

impl FramePacket {
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self { data: data.into(), sequence }
    }

    /// Decode one datagram: a signed 32-bit little-endian length followed by
    /// that many payload bytes. Trailing bytes beyond the declared length
    /// are ignored.
    pub fn decode(datagram: &[u8], sequence: u64) -> Result<Self, MalformedFrame> {
        let Some((prefix, rest)) = datagram.split_first_chunk::<LENGTH_PREFIX_LEN>() else {
            return Err(MalformedFrame::Truncated { len: datagram.len() });
        };

        let declared = i32::from_le_bytes(*prefix);
        if declared < 0 {
            return Err(MalformedFrame::NegativeLength { declared });
        }

        let declared = declared as usize;
        if declared > rest.len() {
            return Err(MalformedFrame::LengthOverrun { declared, available: rest.len() });
        }

        Ok(Self { data: Arc::from(&rest[..declared]), sequence })
    }

    /// Encode a payload in the wire layout. Used by test senders and benches.
    pub fn encode(payload: &[u8]) -> Vec<u8> {
        let mut datagram = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
        datagram.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        datagram.extend_from_slice(payload);
        datagram
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
