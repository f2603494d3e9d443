//! DNS wire format (RFC 1035 §4).
//!
//! [`decode`] turns raw bytes into a [`Message`](ferrous_forwarder_domain::Message) and
//! follows compression pointers, rejecting any that do not point strictly backwards.
//! [`encode`] writes a message with name compression and never fails for size: records
//! that do not fit `max_size` are dropped and the TC bit is set instead.

mod decoder;
mod encoder;

pub use decoder::decode;
pub use encoder::encode;

pub(crate) const HEADER_LEN: usize = 12;

/// Largest offset a compression pointer can address (14 bits).
pub(crate) const MAX_POINTER_OFFSET: usize = 0x3FFF;
