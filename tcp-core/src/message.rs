//! Messages exchanged between the sender and receiver roles
//!
//! A [`Segment`] travels from a sender to the peer's receiver and carries
//! stream bytes. An [`AckMessage`] travels back and carries the cumulative
//! acknowledgment plus the receiver's window. Framing these onto a datagram is
//! the transport's job.

use crate::wrap::Wrap32;
use bytes::Bytes;
use std::fmt;

/// Maximum payload bytes carried by one segment
pub const MAX_PAYLOAD_SIZE: usize = 1000;

/// Sender → receiver segment
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// Sequence number of the SYN if present, otherwise of the first payload byte
    pub seqno: Wrap32,
    /// Start of stream; occupies one sequence number
    pub syn: bool,
    /// Stream bytes
    pub payload: Bytes,
    /// End of stream; occupies one sequence number after the payload
    pub fin: bool,
    /// Abort
    pub rst: bool,
}

impl Segment {
    /// Create a segment with no flags set
    pub fn new(seqno: Wrap32, payload: Bytes) -> Self {
        Segment {
            seqno,
            payload,
            ..Default::default()
        }
    }

    /// Number of sequence numbers this segment occupies
    pub fn sequence_length(&self) -> u64 {
        u64::from(self.syn) + self.payload.len() as u64 + u64::from(self.fin)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("seqno", &self.seqno)
            .field("syn", &self.syn)
            .field("payload_len", &self.payload.len())
            .field("fin", &self.fin)
            .field("rst", &self.rst)
            .finish()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq={}", self.seqno)?;
        if self.syn {
            write!(f, " SYN")?;
        }
        if !self.payload.is_empty() {
            write!(f, " len={}", self.payload.len())?;
        }
        if self.fin {
            write!(f, " FIN")?;
        }
        if self.rst {
            write!(f, " RST")?;
        }
        Ok(())
    }
}

/// Receiver → sender acknowledgment and window report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckMessage {
    /// Next sequence number the receiver needs; absent until a SYN is seen
    pub ackno: Option<Wrap32>,
    /// Sequence numbers the receiver is willing to accept beyond `ackno`
    pub window_size: u16,
    /// Abort
    pub rst: bool,
}

impl AckMessage {
    /// Create an acknowledgment without the reset flag
    pub fn new(ackno: Option<Wrap32>, window_size: u16) -> Self {
        AckMessage {
            ackno,
            window_size,
            rst: false,
        }
    }
}

impl fmt::Display for AckMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ackno {
            Some(ackno) => write!(f, "ack={} win={}", ackno, self.window_size)?,
            None => write!(f, "ack=- win={}", self.window_size)?,
        }
        if self.rst {
            write!(f, " RST")?;
        }
        Ok(())
    }
}
