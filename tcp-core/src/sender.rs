//! Sending side of a connection
//!
//! Drains the outbound [`ByteStream`] into [`Segment`]s within the peer's
//! advertised window, keeps every transmitted segment until it is
//! acknowledged, and retransmits the oldest one when the
//! [`RetransmissionTimer`] expires.
//!
//! Transmission goes through a caller-supplied closure, so this type never
//! touches a socket.

use crate::byte_stream::{ByteStream, Writer};
use crate::config::TcpConfig;
use crate::message::{AckMessage, Segment, MAX_PAYLOAD_SIZE};
use crate::timer::RetransmissionTimer;
use crate::wrap::Wrap32;
use std::collections::VecDeque;
use std::time::Duration;

/// Sender role
#[derive(Debug)]
pub struct Sender {
    /// Bytes written by the application, waiting to be segmented
    input: ByteStream,
    /// Our initial sequence number
    isn: Wrap32,
    initial_rto: Duration,
    syn_sent: bool,
    fin_sent: bool,
    /// Last window reported by the peer
    window_size: u16,
    /// Absolute sequence number of the next new byte to send
    next_seqno: u64,
    /// Absolute sequence number up to which everything is acknowledged
    acked_seqno: u64,
    /// Transmitted, not yet fully acknowledged; oldest first
    outstanding: VecDeque<Segment>,
    consecutive_retransmissions: u64,
    timer: RetransmissionTimer,
}

impl Sender {
    /// Create a sender draining `input`
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto: Duration) -> Self {
        Sender {
            input,
            isn,
            initial_rto,
            syn_sent: false,
            fin_sent: false,
            // Lets the SYN out before the peer has reported anything
            window_size: 1,
            next_seqno: 0,
            acked_seqno: 0,
            outstanding: VecDeque::new(),
            consecutive_retransmissions: 0,
            timer: RetransmissionTimer::new(initial_rto),
        }
    }

    /// Create a sender from connection configuration
    pub fn with_config(config: &TcpConfig, isn: Wrap32) -> Self {
        Self::new(ByteStream::new(config.capacity), isn, config.initial_rto())
    }

    /// Window used for sending; a zero window is probed as if it were one
    fn effective_window(&self) -> u64 {
        u64::from(self.window_size.max(1))
    }

    /// Fill the peer's window with new segments
    pub fn push<F>(&mut self, mut transmit: F)
    where
        F: FnMut(&Segment),
    {
        while self.effective_window() > self.sequence_numbers_in_flight() {
            if self.fin_sent {
                break;
            }

            let mut segment = self.make_empty_message();
            if !self.syn_sent {
                segment.syn = true;
                self.syn_sent = true;
            }

            let remaining = self.effective_window() - self.sequence_numbers_in_flight();
            let len = (MAX_PAYLOAD_SIZE as u64).min(remaining - segment.sequence_length());
            segment.payload = self.input.reader().read(len);

            if remaining > segment.sequence_length() && self.input.is_finished() {
                segment.fin = true;
                self.fin_sent = true;
            }

            if segment.sequence_length() == 0 {
                break;
            }

            tracing::trace!(%segment, "transmit");
            transmit(&segment);
            if !self.timer.is_active() {
                self.timer.start();
            }

            self.next_seqno += segment.sequence_length();
            self.outstanding.push_back(segment);
        }
    }

    /// A segment with no payload or flags at the next sequence number
    ///
    /// Carries RST when the outbound stream has failed.
    pub fn make_empty_message(&self) -> Segment {
        Segment {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            rst: self.input.has_error(),
            ..Default::default()
        }
    }

    /// Process an acknowledgment from the peer's receiver
    pub fn receive(&mut self, message: &AckMessage) {
        self.window_size = message.window_size;

        if message.rst {
            tracing::debug!("reset received, outbound stream failed");
            self.input.writer().set_error();
            return;
        }

        let Some(ackno) = message.ackno else {
            return;
        };

        let ackno = ackno.unwrap(self.isn, self.acked_seqno);
        if ackno > self.next_seqno {
            tracing::debug!(
                ackno,
                next_seqno = self.next_seqno,
                "ignoring ack beyond anything sent"
            );
            return;
        }

        while let Some(front) = self.outstanding.front() {
            let front_len = front.sequence_length();
            if ackno < self.acked_seqno + front_len {
                break;
            }

            self.acked_seqno += front_len;
            self.outstanding.pop_front();
            self.consecutive_retransmissions = 0;
            self.timer.set_rto(self.initial_rto);
            self.timer.restart();
        }

        if self.outstanding.is_empty() {
            self.timer.stop();
        }
    }

    /// Advance time by `elapsed` and retransmit if the timer expired
    pub fn tick<F>(&mut self, elapsed: Duration, mut transmit: F)
    where
        F: FnMut(&Segment),
    {
        self.timer.tick(elapsed);
        if !self.timer.is_expired() {
            return;
        }

        while let Some(front) = self.outstanding.front() {
            let start = front.seqno.unwrap(self.isn, self.next_seqno);
            if start + front.sequence_length() <= self.acked_seqno {
                self.outstanding.pop_front();
                continue;
            }

            tracing::debug!(
                segment = %front,
                rto_ms = self.timer.rto().as_millis() as u64,
                attempt = self.consecutive_retransmissions + 1,
                "retransmit"
            );
            transmit(front);

            if self.window_size != 0 {
                self.consecutive_retransmissions += 1;
                self.timer.back_off();
            }
            self.timer.restart();
            return;
        }

        self.timer.stop();
    }

    /// Sequence numbers sent but not yet acknowledged
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.next_seqno - self.acked_seqno
    }

    /// Retransmissions since the last acknowledgment that made progress
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    /// Write side of the outbound stream, for the application
    pub fn writer(&mut self) -> Writer<'_> {
        self.input.writer()
    }

    /// The outbound stream
    pub fn input(&self) -> &ByteStream {
        &self.input
    }

    pub fn timer(&self) -> &RetransmissionTimer {
        &self.timer
    }

    pub fn isn(&self) -> Wrap32 {
        self.isn
    }
}
