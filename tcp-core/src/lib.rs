//! Reliable byte-stream transport core
//!
//! This crate implements the logic of a TCP-style transport without any I/O:
//! a bounded byte stream with split reader/writer roles, an out-of-order
//! reassembler, 32-bit wrapped sequence numbers, and sender/receiver roles with
//! sliding-window flow control and retransmission. Everything is driven by
//! explicit calls; time only advances through `Sender::tick`.

pub mod byte_stream;
pub mod config;
pub mod message;
pub mod reassembler;
pub mod receiver;
pub mod sender;
pub mod timer;
pub mod wrap;

pub use byte_stream::{ByteStream, Reader, Writer};
pub use config::{ConfigError, TcpConfig};
pub use message::{AckMessage, Segment, MAX_PAYLOAD_SIZE};
pub use reassembler::Reassembler;
pub use receiver::Receiver;
pub use sender::Sender;
pub use timer::RetransmissionTimer;
pub use wrap::Wrap32;
