use super::{RData, RecordClass, RecordType};
use crate::dns_message::Name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub record_type: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: RData,
}

impl ResourceRecord {
    pub fn new(name: Name, record_type: RecordType, ttl: u32, data: RData) -> Self {
        Self {
            name,
            record_type,
            class: RecordClass::IN,
            ttl,
            data,
        }
    }

    /// EDNS(0) OPT pseudo-record advertising `udp_payload_size`.
    pub fn opt(udp_payload_size: u16) -> Self {
        Self {
            name: Name::root(),
            record_type: RecordType::OPT,
            class: RecordClass::from_u16(udp_payload_size),
            ttl: 0,
            data: RData::Other(Box::new([])),
        }
    }

    pub fn is_opt(&self) -> bool {
        self.record_type == RecordType::OPT
    }

    pub fn with_ttl(&self, ttl: u32) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }
}
