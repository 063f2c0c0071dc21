//! Scenario tests for the individual protocol components

use bytes::Bytes;
use std::time::Duration;
use tcp_core::{
    AckMessage, ByteStream, Reassembler, Receiver, Segment, Sender, TcpConfig, Wrap32,
    MAX_PAYLOAD_SIZE,
};

#[test]
fn test_truncating_push() {
    let mut stream = ByteStream::new(3);

    stream.writer().push("abc");
    assert_eq!(stream.writer().available_capacity(), 0);

    stream.writer().push("de");
    assert_eq!(stream.writer().bytes_pushed(), 3);

    let mut reader = stream.reader();
    assert_eq!(reader.peek(), b"abc");
    reader.pop(3);
    assert_eq!(reader.bytes_buffered(), 0);
}

#[test]
fn test_simple_reassembly() {
    let mut reassembler = Reassembler::new(ByteStream::new(4));
    reassembler.insert(0, Bytes::from("ab"), false);
    reassembler.insert(2, Bytes::from("cd"), true);

    let mut reader = reassembler.reader();
    assert_eq!(&reader.read(4)[..], b"abcd");
    assert!(reader.is_finished());
}

#[test]
fn test_syn_establishes_isn() {
    let isn = Wrap32::new(0x8000_0000);
    let capacity = 2500;
    let mut receiver = Receiver::new(capacity);

    let mut syn = Segment::new(Wrap32::wrap(0, isn), Bytes::new());
    syn.syn = true;
    receiver.receive(syn);

    let ack = receiver.send();
    assert_eq!(ack.ackno, Some(Wrap32::wrap(1, isn)));
    assert_eq!(u64::from(ack.window_size), capacity);
    assert!(!ack.rst);
}

#[test]
fn test_zero_window_probing() {
    let isn = Wrap32::new(4242);
    let mut sender = Sender::new(ByteStream::new(64), isn, Duration::from_millis(100));

    let mut sent = Vec::new();
    sender.push(|s| sent.push(s.clone()));
    sender.receive(&AckMessage::new(Some(isn + 1), 0));

    sender.writer().push("probe me");
    sent.clear();
    sender.push(|s| sent.push(s.clone()));

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload.len(), 1);
    assert_eq!(sent[0].sequence_length(), 1);

    // Still stalled until the window reopens
    sender.push(|s| sent.push(s.clone()));
    assert_eq!(sent.len(), 1);

    sender.receive(&AckMessage::new(Some(isn + 2), 100));
    sender.push(|s| sent.push(s.clone()));
    assert_eq!(sent.len(), 2);
    assert_eq!(&sent[1].payload[..], b"robe me");
}

#[test]
fn test_backoff_and_reset() {
    let rto = Duration::from_millis(250);
    let isn = Wrap32::new(7);
    let mut sender = Sender::new(ByteStream::new(64), isn, rto);

    sender.push(|_| {});
    sender.receive(&AckMessage::new(Some(isn + 1), 10));
    sender.writer().push("payload");
    sender.push(|_| {});

    let mut expected = rto;
    for attempt in 1..=5u64 {
        let mut resent = 0;
        sender.tick(expected, |_| resent += 1);
        assert_eq!(resent, 1);
        assert_eq!(sender.consecutive_retransmissions(), attempt);
        expected *= 2;
        assert_eq!(sender.timer().rto(), expected);
    }

    sender.receive(&AckMessage::new(Some(isn + 8), 10));
    assert_eq!(sender.consecutive_retransmissions(), 0);
    assert_eq!(sender.timer().rto(), rto);
    assert!(!sender.timer().is_active());
}

#[test]
fn test_stale_ack_after_wraparound() {
    let isn = Wrap32::new(u32::MAX - 1);
    let mut sender = Sender::new(ByteStream::new(64), isn, Duration::from_millis(100));

    sender.push(|_| {});
    sender.receive(&AckMessage::new(Some(isn + 1), 10));
    sender.writer().push("abc");
    sender.push(|_| {});
    assert_eq!(sender.sequence_numbers_in_flight(), 3);

    // Ack for the SYN again: nothing new covered
    sender.receive(&AckMessage::new(Some(isn + 1), 10));
    assert_eq!(sender.sequence_numbers_in_flight(), 3);

    sender.receive(&AckMessage::new(Some(isn + 4), 10));
    assert_eq!(sender.sequence_numbers_in_flight(), 0);
}

#[test]
fn test_sender_receiver_exchange() {
    let config = TcpConfig {
        capacity: 3000,
        initial_rto_ms: 100,
    };
    let isn = Wrap32::new(99);
    let mut sender = Sender::with_config(&config, isn);
    let mut receiver = Receiver::with_config(&config);

    // Handshake-equivalent: SYN out, window back
    let mut segments = Vec::new();
    sender.push(|s| segments.push(s.clone()));
    for s in segments.drain(..) {
        receiver.receive(s);
    }
    sender.receive(&receiver.send());
    assert_eq!(sender.sequence_numbers_in_flight(), 0);

    sender.writer().push(vec![b'z'; 2 * MAX_PAYLOAD_SIZE + 10]);
    sender.writer().close();
    sender.push(|s| segments.push(s.clone()));
    assert_eq!(segments.len(), 3);
    assert!(segments[2].fin);

    for s in segments.drain(..) {
        receiver.receive(s);
    }
    let ack = receiver.send();
    assert_eq!(ack.ackno, Some(Wrap32::wrap(2 * MAX_PAYLOAD_SIZE as u64 + 12, isn)));

    sender.receive(&ack);
    assert_eq!(sender.sequence_numbers_in_flight(), 0);
    assert!(receiver.output().is_closed());
    assert_eq!(
        receiver.output().bytes_pushed(),
        2 * MAX_PAYLOAD_SIZE as u64 + 10
    );
}

#[test]
fn test_reset_propagates_to_peer() {
    let isn = Wrap32::new(0);
    let mut sender = Sender::new(ByteStream::new(64), isn, Duration::from_millis(100));
    let mut receiver = Receiver::new(64);

    let mut segments = Vec::new();
    sender.push(|s| segments.push(s.clone()));
    receiver.receive(segments.remove(0));

    sender.writer().set_error();
    let reset = sender.make_empty_message();
    assert!(reset.rst);

    receiver.receive(reset);
    assert!(receiver.output().has_error());
    assert!(receiver.send().rst);

    // And back the other way
    let mut other = Sender::new(ByteStream::new(64), isn, Duration::from_millis(100));
    other.receive(&receiver.send());
    assert!(other.input().has_error());
}
