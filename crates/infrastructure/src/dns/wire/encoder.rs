use super::MAX_POINTER_OFFSET;
use ferrous_forwarder_domain::{DomainError, Message, Name, RData, ResourceRecord};
use rustc_hash::FxHashMap;

const MAX_RDATA_LEN: usize = u16::MAX as usize;
const MAX_CHARACTER_STRING: usize = 255;

/// Serializes `message`, keeping the result within `max_size` bytes.
///
/// Records are written in section order. The first record that would overflow
/// `max_size` is rolled back, every later record is dropped and TC is set. An OPT
/// pseudo-record is still appended when it fits, so EDNS clients keep seeing it.
pub fn encode(message: &Message, max_size: usize) -> Result<Vec<u8>, DomainError> {
    let mut writer = Writer::with_capacity(max_size.min(4096));

    writer.put_u16(message.header.id);
    writer.put_u16(0);
    writer.put_slice(&[0; 8]);

    let mut truncated = false;
    let mut opt_written = false;
    let mut counts = [0u16; 4];

    for question in &message.questions {
        let mark = writer.mark();
        writer.put_name(&question.name);
        writer.put_u16(question.record_type.to_u16());
        writer.put_u16(question.class.to_u16());
        if writer.len() > max_size {
            writer.rollback(mark);
            truncated = true;
            break;
        }
        counts[0] += 1;
    }

    let sections = [&message.answers, &message.authority, &message.additional];
    'sections: for (index, section) in sections.iter().enumerate() {
        if truncated {
            break;
        }
        for record in section.iter() {
            let mark = writer.mark();
            writer.put_record(record)?;
            if writer.len() > max_size {
                writer.rollback(mark);
                truncated = true;
                break 'sections;
            }
            counts[index + 1] += 1;
            opt_written |= record.is_opt();
        }
    }

    if truncated && !opt_written {
        if let Some(opt) = message.additional.iter().find(|r| r.is_opt()) {
            let mark = writer.mark();
            writer.put_record(opt)?;
            if writer.len() > max_size {
                writer.rollback(mark);
            } else {
                counts[3] += 1;
            }
        }
    }

    let mut flags = message.header.flags();
    if truncated {
        flags |= 0x0200;
    }

    let mut bytes = writer.finish();
    bytes[2..4].copy_from_slice(&flags.to_be_bytes());
    for (i, count) in counts.iter().enumerate() {
        let at = 4 + i * 2;
        bytes[at..at + 2].copy_from_slice(&count.to_be_bytes());
    }
    Ok(bytes)
}

struct Writer {
    buf: Vec<u8>,
    /// Exact wire form of each name suffix written so far, with its offset.
    names: FxHashMap<Vec<u8>, u16>,
}

impl Writer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            names: FxHashMap::default(),
        }
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn mark(&self) -> usize {
        self.buf.len()
    }

    /// Drops everything written after `mark`, including compression targets
    /// that would now point past the end of the buffer.
    fn rollback(&mut self, mark: usize) {
        self.buf.truncate(mark);
        self.names.retain(|_, offset| usize::from(*offset) < mark);
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn put_name(&mut self, name: &Name) {
        let labels = name.suffix(0);
        for i in 0..labels.len() {
            let key = suffix_key(&labels[i..]);
            if let Some(&offset) = self.names.get(&key) {
                self.put_u16(0xC000 | offset);
                return;
            }
            let here = self.buf.len();
            if here <= MAX_POINTER_OFFSET {
                self.names.insert(key, here as u16);
            }
            self.buf.push(labels[i].len() as u8);
            self.buf.extend_from_slice(&labels[i]);
        }
        self.buf.push(0);
    }

    fn put_uncompressed_name(&mut self, name: &Name) {
        for label in name.labels() {
            self.buf.push(label.len() as u8);
            self.buf.extend_from_slice(label);
        }
        self.buf.push(0);
    }

    fn put_record(&mut self, record: &ResourceRecord) -> Result<(), DomainError> {
        if record.is_opt() {
            self.put_uncompressed_name(&record.name);
        } else {
            self.put_name(&record.name);
        }
        self.put_u16(record.record_type.to_u16());
        self.put_u16(record.class.to_u16());
        self.put_u32(record.ttl);

        let len_at = self.buf.len();
        self.put_u16(0);
        self.put_rdata(&record.data)?;

        let rd_len = self.buf.len() - len_at - 2;
        if rd_len > MAX_RDATA_LEN {
            return Err(DomainError::FormatError(format!(
                "{} record data of {} bytes does not fit RDLENGTH",
                record.record_type, rd_len
            )));
        }
        self.buf[len_at..len_at + 2].copy_from_slice(&(rd_len as u16).to_be_bytes());
        Ok(())
    }

    fn put_rdata(&mut self, data: &RData) -> Result<(), DomainError> {
        match data {
            RData::A(ip) => self.put_slice(&ip.octets()),
            RData::AAAA(ip) => self.put_slice(&ip.octets()),
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => self.put_name(name),
            RData::MX {
                preference,
                exchange,
            } => {
                self.put_u16(*preference);
                self.put_name(exchange);
            }
            RData::SOA(soa) => {
                self.put_name(&soa.mname);
                self.put_name(&soa.rname);
                self.put_u32(soa.serial);
                self.put_u32(soa.refresh);
                self.put_u32(soa.retry);
                self.put_u32(soa.expire);
                self.put_u32(soa.minimum);
            }
            RData::TXT(strings) => {
                for s in strings {
                    if s.len() > MAX_CHARACTER_STRING {
                        return Err(DomainError::FormatError(format!(
                            "TXT character-string of {} bytes exceeds {}",
                            s.len(),
                            MAX_CHARACTER_STRING
                        )));
                    }
                    self.buf.push(s.len() as u8);
                    self.put_slice(s);
                }
            }
            RData::Other(raw) => self.put_slice(raw),
        }
        Ok(())
    }
}

fn suffix_key(labels: &[Box<[u8]>]) -> Vec<u8> {
    let mut key = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum());
    for label in labels {
        key.push(label.len() as u8);
        key.extend_from_slice(label);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::wire::decode;
    use ferrous_forwarder_domain::{Question, RecordType};
    use std::net::Ipv4Addr;

    fn a_record(name: &str, ip: [u8; 4]) -> ResourceRecord {
        ResourceRecord::new(
            name.parse().unwrap(),
            RecordType::A,
            300,
            RData::A(Ipv4Addr::from(ip)),
        )
    }

    fn response_with_answers(count: usize) -> Message {
        let mut message = Message::query(
            7,
            Question::new("www.example.com".parse().unwrap(), RecordType::A),
        );
        message.header.response = true;
        for i in 0..count {
            message
                .answers
                .push(a_record("www.example.com", [10, 0, (i >> 8) as u8, i as u8]));
        }
        message
    }

    #[test]
    fn test_encode_header_counts_follow_sections() {
        let bytes = encode(&response_with_answers(3), 512).unwrap();
        assert_eq!(&bytes[0..2], &[0x00, 0x07]);
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 1);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 3);
    }

    #[test]
    fn test_encode_compresses_repeated_names() {
        let bytes = encode(&response_with_answers(2), 512).unwrap();
        // header + question + two answers each made of a 2-byte pointer and 14 fixed bytes
        let question_len = 17 + 4;
        assert_eq!(bytes.len(), 12 + question_len + 2 * 16);
    }

    #[test]
    fn test_encode_keeps_case_of_every_name() {
        let mut message = Message::query(
            7,
            Question::new("Example.COM".parse().unwrap(), RecordType::A),
        );
        message.header.response = true;
        message.answers.push(a_record("example.com", [1, 2, 3, 4]));
        message.answers.push(a_record("WWW.Example.COM", [5, 6, 7, 8]));
        message.answers.push(a_record("www.example.com", [9, 9, 9, 9]));

        let bytes = encode(&message, 512).unwrap();
        assert_eq!(decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_encode_compresses_identical_spelling_only() {
        let mut message = response_with_answers(0);
        message.answers.push(a_record("www.example.com", [1, 2, 3, 4]));
        let compressed = encode(&message, 512).unwrap().len();

        message.answers[0] = a_record("WWW.EXAMPLE.COM", [1, 2, 3, 4]);
        let uncompressed = encode(&message, 512).unwrap().len();

        assert_eq!(compressed, 12 + 21 + 16);
        assert_eq!(uncompressed, 12 + 21 + 17 + 14);
    }

    #[test]
    fn test_encode_truncates_instead_of_failing() {
        let message = response_with_answers(40);
        let bytes = encode(&message, 512).unwrap();
        assert!(bytes.len() <= 512);

        let decoded = decode(&bytes).unwrap();
        assert!(decoded.is_truncated());
        assert!(decoded.answers.len() < 40);
        assert_eq!(decoded.questions.len(), 1);
    }

    #[test]
    fn test_encode_keeps_opt_when_truncating() {
        let mut message = response_with_answers(40);
        message.set_opt(1232);
        let bytes = encode(&message, 512).unwrap();
        assert!(bytes.len() <= 512);

        let decoded = decode(&bytes).unwrap();
        assert!(decoded.is_truncated());
        assert_eq!(decoded.edns_payload_size(), Some(1232));
    }

    #[test]
    fn test_rollback_discards_compression_targets() {
        let mut message = response_with_answers(0);
        for i in 0..30u8 {
            message
                .answers
                .push(a_record(&format!("host{}.example.com", i), [10, 0, 0, i]));
        }
        let bytes = encode(&message, 300).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.is_truncated());
        for (i, record) in decoded.answers.iter().enumerate() {
            assert_eq!(record.name.to_string(), format!("host{}.example.com", i));
        }
    }

    #[test]
    fn test_encode_rejects_oversized_txt_string() {
        let mut message = response_with_answers(0);
        message.answers.push(ResourceRecord::new(
            "example.com".parse().unwrap(),
            RecordType::TXT,
            60,
            RData::TXT(vec![vec![b'x'; 256].into_boxed_slice()]),
        ));
        assert!(matches!(
            encode(&message, 65535),
            Err(DomainError::FormatError(_))
        ));
    }
}
