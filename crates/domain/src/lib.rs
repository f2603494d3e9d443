//! Ferrous Forwarder Domain Layer
pub mod client_context;
pub mod config;
pub mod dns_message;
pub mod dns_protocol;
pub mod dns_record;
pub mod errors;
pub mod query_event;

pub use client_context::ClientContext;
pub use config::{CacheConfig, CliOverrides, Config, ConfigError, ServerConfig, UpstreamConfig};
pub use dns_message::{Header, Message, Name, Opcode, Question, ResponseCode};
pub use dns_protocol::{DnsProtocol, TransportKind};
pub use dns_record::{RData, RecordClass, RecordType, ResourceRecord, Soa};
pub use errors::DomainError;
pub use query_event::QueryEvent;
