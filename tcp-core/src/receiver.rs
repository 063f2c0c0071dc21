//! Receiving side of a connection
//!
//! Turns inbound [`Segment`]s into stream bytes via the [`Reassembler`] and
//! reports the cumulative acknowledgment and window as an [`AckMessage`].

use crate::byte_stream::{ByteStream, Reader};
use crate::config::TcpConfig;
use crate::message::{AckMessage, Segment};
use crate::reassembler::Reassembler;
use crate::wrap::Wrap32;

/// Receiver role
#[derive(Debug)]
pub struct Receiver {
    reassembler: Reassembler,
    /// Zero point of the peer's sequence space, set by the first SYN
    isn: Option<Wrap32>,
}

impl Receiver {
    /// Create a receiver whose inbound stream holds `capacity` bytes
    pub fn new(capacity: u64) -> Self {
        Receiver {
            reassembler: Reassembler::new(ByteStream::new(capacity)),
            isn: None,
        }
    }

    /// Create a receiver from connection configuration
    pub fn with_config(config: &TcpConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Process one inbound segment
    pub fn receive(&mut self, segment: Segment) {
        if segment.rst {
            tracing::debug!("reset received, inbound stream failed");
            self.reassembler.writer().set_error();
            return;
        }

        if self.reassembler.output().has_error() {
            return;
        }

        let isn = match self.isn {
            Some(isn) => isn,
            None if segment.syn => {
                tracing::debug!(isn = %segment.seqno, "peer ISN adopted");
                self.isn = Some(segment.seqno);
                segment.seqno
            }
            None => {
                tracing::trace!(seqno = %segment.seqno, "segment before SYN ignored");
                return;
            }
        };

        let syn = u64::from(segment.syn);
        let checkpoint = self.reassembler.output().bytes_pushed() + syn;
        let absolute = segment.seqno.unwrap(isn, checkpoint);

        // SYN takes sequence number 0, so stream byte 0 is absolute 1. A
        // non-SYN segment at absolute 0 has nothing to deliver.
        let Some(stream_index) = (absolute + syn).checked_sub(1) else {
            tracing::trace!(seqno = %segment.seqno, "segment aliases the SYN, ignored");
            return;
        };

        self.reassembler.insert(stream_index, segment.payload, segment.fin);
    }

    /// Build the acknowledgment for the current state
    pub fn send(&self) -> AckMessage {
        let output = self.reassembler.output();
        let window_size = output.available_capacity().min(u64::from(u16::MAX)) as u16;

        // +1 for the SYN, and +1 more once the FIN has been assembled
        let ackno = self.isn.map(|isn| {
            Wrap32::wrap(output.bytes_pushed() + u64::from(output.is_closed()), isn) + 1
        });

        AckMessage {
            ackno,
            window_size,
            rst: output.has_error(),
        }
    }

    /// Read side of the inbound stream, for the application
    pub fn reader(&mut self) -> Reader<'_> {
        self.reassembler.reader()
    }

    /// The inbound stream
    pub fn output(&self) -> &ByteStream {
        self.reassembler.output()
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// Peer ISN, once a SYN has been received
    pub fn isn(&self) -> Option<Wrap32> {
        self.isn
    }
}
