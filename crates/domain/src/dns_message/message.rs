use super::{Header, Question, ResponseCode};
use crate::dns_record::{RData, RecordType, ResourceRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// A recursive query with a single question.
    pub fn query(id: u16, question: Question) -> Self {
        Self {
            header: Header::query(id),
            questions: vec![question],
            answers: vec![],
            authority: vec![],
            additional: vec![],
        }
    }

    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn response_code(&self) -> ResponseCode {
        self.header.response_code
    }

    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn is_truncated(&self) -> bool {
        self.header.truncated
    }

    /// UDP payload size the sender advertised through EDNS(0), if any.
    pub fn edns_payload_size(&self) -> Option<u16> {
        self.additional
            .iter()
            .find(|r| r.is_opt())
            .map(|r| r.class.to_u16())
    }

    pub fn remove_opt(&mut self) {
        self.additional.retain(|r| !r.is_opt());
    }

    pub fn set_opt(&mut self, udp_payload_size: u16) {
        self.remove_opt();
        self.additional.push(ResourceRecord::opt(udp_payload_size));
    }

    /// NXDOMAIN, or NOERROR with an empty answer section (NODATA).
    pub fn is_negative(&self) -> bool {
        match self.header.response_code {
            ResponseCode::NXDomain => true,
            ResponseCode::NoError => self.answers.is_empty(),
            _ => false,
        }
    }

    /// Smallest TTL among answer, authority and additional records, OPT excluded.
    pub fn min_ttl(&self) -> Option<u32> {
        self.answers
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
            .filter(|r| !r.is_opt())
            .map(|r| r.ttl)
            .min()
    }

    /// Negative-caching TTL from the authority SOA: min(SOA MINIMUM, SOA TTL).
    pub fn soa_negative_ttl(&self) -> Option<u32> {
        self.authority.iter().find_map(|r| match (&r.record_type, &r.data) {
            (RecordType::SOA, RData::SOA(soa)) => Some(soa.minimum.min(r.ttl)),
            _ => None,
        })
    }

    pub fn record_count(&self) -> usize {
        self.answers.len() + self.authority.len() + self.additional.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_message::Name;
    use crate::dns_record::Soa;
    use std::net::Ipv4Addr;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn a_record(ttl: u32) -> ResourceRecord {
        ResourceRecord::new(
            name("example.com"),
            RecordType::A,
            ttl,
            RData::A(Ipv4Addr::new(93, 184, 216, 34)),
        )
    }

    #[test]
    fn test_min_ttl_ignores_opt() {
        let mut msg = Message::query(7, Question::new(name("example.com"), RecordType::A));
        msg.answers.push(a_record(300));
        msg.answers.push(a_record(120));
        msg.set_opt(1232);
        assert_eq!(msg.min_ttl(), Some(120));
        assert_eq!(msg.edns_payload_size(), Some(1232));
    }

    #[test]
    fn test_set_opt_replaces_existing() {
        let mut msg = Message::query(7, Question::new(name("example.com"), RecordType::A));
        msg.set_opt(4096);
        msg.set_opt(512);
        assert_eq!(msg.additional.len(), 1);
        assert_eq!(msg.edns_payload_size(), Some(512));
        msg.remove_opt();
        assert_eq!(msg.edns_payload_size(), None);
    }

    #[test]
    fn test_negative_detection() {
        let mut msg = Message::query(1, Question::new(name("nope.example"), RecordType::A));
        msg.header.response = true;
        assert!(msg.is_negative());
        msg.answers.push(a_record(60));
        assert!(!msg.is_negative());
        msg.header.response_code = ResponseCode::ServFail;
        assert!(!msg.is_negative());
    }

    #[test]
    fn test_soa_negative_ttl() {
        let mut msg = Message::query(1, Question::new(name("nope.example"), RecordType::A));
        msg.authority.push(ResourceRecord::new(
            name("example"),
            RecordType::SOA,
            900,
            RData::SOA(Soa {
                mname: name("ns.example"),
                rname: name("hostmaster.example"),
                serial: 1,
                refresh: 7200,
                retry: 900,
                expire: 1209600,
                minimum: 3600,
            }),
        ));
        assert_eq!(msg.soa_negative_ttl(), Some(900));
    }
}
