#![allow(dead_code)]
use ferrous_forwarder_domain::{
    Header, Message, Name, Question, RData, RecordClass, RecordType, ResourceRecord,
    ResponseCode,
};
use std::net::Ipv4Addr;

pub struct RecordBuilder {
    name: Name,
    record_type: RecordType,
    ttl: u32,
    data: RData,
}

impl RecordBuilder {
    pub fn a(name: &str, ip: [u8; 4]) -> Self {
        Self {
            name: name.parse().unwrap(),
            record_type: RecordType::A,
            ttl: 300,
            data: RData::A(Ipv4Addr::from(ip)),
        }
    }

    pub fn cname(name: &str, target: &str) -> Self {
        Self {
            name: name.parse().unwrap(),
            record_type: RecordType::CNAME,
            ttl: 300,
            data: RData::CNAME(target.parse().unwrap()),
        }
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn build(self) -> ResourceRecord {
        ResourceRecord {
            name: self.name,
            record_type: self.record_type,
            class: RecordClass::IN,
            ttl: self.ttl,
            data: self.data,
        }
    }
}

pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn query(id: u16, name: &str, record_type: RecordType) -> Self {
        Self {
            message: Message::query(id, Question::new(name.parse().unwrap(), record_type)),
        }
    }

    pub fn response_to(query: &Message) -> Self {
        let mut message = query.clone();
        message.header = Header {
            response: true,
            recursion_available: true,
            ..query.header
        };
        Self { message }
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.message.header.response_code = rcode;
        self
    }

    pub fn answer(mut self, record: ResourceRecord) -> Self {
        self.message.answers.push(record);
        self
    }

    pub fn authority(mut self, record: ResourceRecord) -> Self {
        self.message.authority.push(record);
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}
