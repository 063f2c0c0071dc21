//! Test harness for tcp-core
//!
//! Connects a [`Sender`] to a [`Receiver`] through a [`Link`] that can drop and
//! reorder segments on a fixed schedule, and drives both ends until the whole
//! stream has been delivered.

use bytes::Bytes;
use std::time::Duration;
use tcp_core::{Receiver, Segment, Sender, TcpConfig, Wrap32};

/// Scripted one-way segment path
#[derive(Debug, Default)]
pub struct Link {
    /// Drop every n-th segment offered (0 = never)
    drop_every: usize,
    /// Deliver each batch in reverse order
    reorder: bool,
    offered: usize,
    dropped: usize,
    queue: Vec<Segment>,
}

impl Link {
    /// A link that delivers everything in order
    pub fn perfect() -> Self {
        Link::default()
    }

    /// A link that drops every `n`-th segment
    pub fn lossy(n: usize) -> Self {
        Link {
            drop_every: n,
            ..Default::default()
        }
    }

    /// Deliver batches back to front
    pub fn reordering(mut self) -> Self {
        self.reorder = true;
        self
    }

    /// Offer a segment to the link
    pub fn send(&mut self, segment: &Segment) {
        self.offered += 1;
        if self.drop_every != 0 && self.offered % self.drop_every == 0 {
            self.dropped += 1;
            return;
        }
        self.queue.push(segment.clone());
    }

    /// Take everything currently in flight
    pub fn deliver(&mut self) -> Vec<Segment> {
        let mut batch = std::mem::take(&mut self.queue);
        if self.reorder {
            batch.reverse();
        }
        batch
    }

    /// Number of segments dropped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of segments offered so far
    pub fn offered(&self) -> usize {
        self.offered
    }
}

/// Result of a driven transfer
#[derive(Debug)]
pub struct Transfer {
    /// Bytes the receiving application read, in order
    pub received: Vec<u8>,
    /// Rounds until both ends were done, or `None` if the limit was hit
    pub rounds: Option<usize>,
    pub sender: Sender,
    pub receiver: Receiver,
}

/// Move `data` from a fresh sender to a fresh receiver over `link`
///
/// Each round the application writes what fits, the sender pushes, the link
/// delivers, the receiving application reads everything, the ack goes back
/// unharmed and `tick` worth of time passes.
pub fn transfer(
    data: &[u8],
    config: &TcpConfig,
    isn: Wrap32,
    link: &mut Link,
    tick: Duration,
    max_rounds: usize,
) -> Transfer {
    let mut sender = Sender::with_config(config, isn);
    let mut receiver = Receiver::with_config(config);
    let mut written = 0usize;
    let mut received = Vec::with_capacity(data.len());

    for round in 0..max_rounds {
        let room = sender.input().available_capacity() as usize;
        let n = room.min(data.len() - written);
        if n > 0 {
            sender
                .writer()
                .push(Bytes::copy_from_slice(&data[written..written + n]));
            written += n;
        }
        if written == data.len() {
            sender.writer().close();
        }

        sender.push(|segment| link.send(segment));
        for segment in link.deliver() {
            receiver.receive(segment);
        }

        let mut reader = receiver.reader();
        let buffered = reader.bytes_buffered();
        received.extend_from_slice(&reader.read(buffered));

        sender.receive(&receiver.send());

        if receiver.output().is_finished() && sender.sequence_numbers_in_flight() == 0 {
            return Transfer {
                received,
                rounds: Some(round + 1),
                sender,
                receiver,
            };
        }

        sender.tick(tick, |segment| link.send(segment));
    }

    Transfer {
        received,
        rounds: None,
        sender,
        receiver,
    }
}

/// Deterministic test payload of `len` bytes
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + i / 251) as u8).collect()
}
