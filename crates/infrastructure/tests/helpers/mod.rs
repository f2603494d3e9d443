#![allow(dead_code)]

pub mod dns_server_mock;
pub mod fake_upstream;
pub mod manual_clock;

pub use dns_server_mock::MockDnsServer;
pub use fake_upstream::{Behavior, FakeExchange};
pub use manual_clock::ManualClock;

use ferrous_forwarder_domain::{Message, Question, RData, RecordType, ResourceRecord};
use std::net::{Ipv4Addr, SocketAddr};

pub fn question(name: &str, record_type: RecordType) -> Question {
    Question::new(name.parse().unwrap(), record_type)
}

pub fn query(id: u16, name: &str, record_type: RecordType) -> Message {
    Message::query(id, question(name, record_type))
}

pub fn a_record(name: &str, ttl: u32, ip: Ipv4Addr) -> ResourceRecord {
    ResourceRecord::new(name.parse().unwrap(), RecordType::A, ttl, RData::A(ip))
}

pub fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}
