use super::HEADER_LEN;
use ferrous_forwarder_domain::{
    DomainError, Header, Message, Name, Question, RData, RecordClass, RecordType, ResourceRecord,
    Soa,
};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Smallest possible resource record: root name + type + class + ttl + rdlength.
const MIN_RECORD_LEN: usize = 11;

/// Parses a complete DNS message.
pub fn decode(bytes: &[u8]) -> Result<Message, DomainError> {
    if bytes.len() < HEADER_LEN {
        return Err(format_error(format!(
            "message of {} bytes is shorter than the header",
            bytes.len()
        )));
    }

    let mut reader = Reader::new(bytes);
    let id = reader.read_u16()?;
    let flags = reader.read_u16()?;
    let qd_count = reader.read_u16()? as usize;
    let an_count = reader.read_u16()? as usize;
    let ns_count = reader.read_u16()? as usize;
    let ar_count = reader.read_u16()? as usize;

    let mut questions = Vec::with_capacity(qd_count.min(4));
    for _ in 0..qd_count {
        questions.push(reader.read_question()?);
    }

    let answers = reader.read_records(an_count)?;
    let authority = reader.read_records(ns_count)?;
    let additional = reader.read_records(ar_count)?;

    Ok(Message {
        header: Header::from_parts(id, flags),
        questions,
        answers,
        authority,
        additional,
    })
}

fn format_error(reason: impl Into<String>) -> DomainError {
    DomainError::FormatError(reason.into())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DomainError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                format_error(format!(
                    "read of {} bytes at offset {} runs past end of message",
                    len, self.pos
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DomainError> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DomainError> {
        let b = self.read_slice(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DomainError> {
        let b = self.read_slice(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a possibly compressed name. Every pointer must target an offset
    /// strictly below the previous jump, so decoding always terminates.
    fn read_name(&mut self) -> Result<Name, DomainError> {
        let mut name = Name::root();
        let mut cursor = self.pos;
        let mut jump_limit = self.pos;
        let mut jumped = false;

        loop {
            let len = *self
                .buf
                .get(cursor)
                .ok_or_else(|| format_error("name runs past end of message"))?;

            match len & 0xC0 {
                0x00 if len == 0 => {
                    cursor += 1;
                    break;
                }
                0x00 => {
                    let start = cursor + 1;
                    let end = start + len as usize;
                    let label = self
                        .buf
                        .get(start..end)
                        .ok_or_else(|| format_error("label runs past end of message"))?;
                    name.push_label(label).map_err(|e| format_error(e.to_string()))?;
                    cursor = end;
                }
                0xC0 => {
                    let low = *self
                        .buf
                        .get(cursor + 1)
                        .ok_or_else(|| format_error("truncated compression pointer"))?;
                    let target = (usize::from(len & 0x3F) << 8) | usize::from(low);
                    if target >= cursor || target >= jump_limit {
                        return Err(format_error(format!(
                            "compression pointer at offset {} does not point backwards (target {})",
                            cursor, target
                        )));
                    }
                    if !jumped {
                        self.pos = cursor + 2;
                        jumped = true;
                    }
                    jump_limit = target;
                    cursor = target;
                }
                _ => {
                    return Err(format_error(format!(
                        "reserved label type 0x{:02X} at offset {}",
                        len & 0xC0,
                        cursor
                    )));
                }
            }
        }

        if !jumped {
            self.pos = cursor;
        }
        Ok(name)
    }

    fn read_question(&mut self) -> Result<Question, DomainError> {
        let name = self.read_name()?;
        let record_type = RecordType::from_u16(self.read_u16()?);
        let class = RecordClass::from_u16(self.read_u16()?);
        Ok(Question {
            name,
            record_type,
            class,
        })
    }

    fn read_records(&mut self, count: usize) -> Result<Vec<ResourceRecord>, DomainError> {
        let mut records = Vec::with_capacity(count.min(self.remaining() / MIN_RECORD_LEN));
        for _ in 0..count {
            records.push(self.read_record()?);
        }
        Ok(records)
    }

    fn read_record(&mut self) -> Result<ResourceRecord, DomainError> {
        let name = self.read_name()?;
        let record_type = RecordType::from_u16(self.read_u16()?);
        let class = RecordClass::from_u16(self.read_u16()?);
        let ttl = self.read_u32()?;
        let rd_len = self.read_u16()? as usize;

        let rdata_start = self.pos;
        if rd_len > self.remaining() {
            return Err(format_error(format!(
                "RDLENGTH {} of {} record exceeds remaining {} bytes",
                rd_len,
                record_type,
                self.remaining()
            )));
        }
        let rdata_end = rdata_start + rd_len;

        let data = self.read_rdata(record_type, rd_len, rdata_end)?;
        if self.pos != rdata_end {
            return Err(format_error(format!(
                "{} record data used {} bytes but RDLENGTH is {}",
                record_type,
                self.pos - rdata_start,
                rd_len
            )));
        }

        Ok(ResourceRecord {
            name,
            record_type,
            class,
            ttl,
            data,
        })
    }

    fn read_rdata(
        &mut self,
        record_type: RecordType,
        rd_len: usize,
        rdata_end: usize,
    ) -> Result<RData, DomainError> {
        let data = match record_type {
            RecordType::A => {
                let b = self.read_slice(4)?;
                RData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            RecordType::AAAA => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(self.read_slice(16)?);
                RData::AAAA(Ipv6Addr::from(octets))
            }
            RecordType::NS => RData::NS(self.read_name()?),
            RecordType::CNAME => RData::CNAME(self.read_name()?),
            RecordType::PTR => RData::PTR(self.read_name()?),
            RecordType::MX => RData::MX {
                preference: self.read_u16()?,
                exchange: self.read_name()?,
            },
            RecordType::SOA => RData::SOA(Soa {
                mname: self.read_name()?,
                rname: self.read_name()?,
                serial: self.read_u32()?,
                refresh: self.read_u32()?,
                retry: self.read_u32()?,
                expire: self.read_u32()?,
                minimum: self.read_u32()?,
            }),
            RecordType::TXT => {
                let mut strings = Vec::new();
                while self.pos < rdata_end {
                    let len = self.read_u8()? as usize;
                    strings.push(self.read_slice(len)?.into());
                }
                RData::TXT(strings)
            }
            _ => RData::Other(self.read_slice(rd_len)?.into()),
        };
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(qd: u16, an: u16) -> Vec<u8> {
        let mut buf = vec![0x12, 0x34, 0x81, 0x80];
        buf.extend_from_slice(&qd.to_be_bytes());
        buf.extend_from_slice(&an.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0, 0]);
        buf
    }

    fn question_example_com(buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"\x07example\x03com\x00");
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_decode_rejects_short_input() {
        assert!(matches!(
            decode(&[0x12, 0x34, 0x01]),
            Err(DomainError::FormatError(_))
        ));
    }

    #[test]
    fn test_decode_answer_with_backward_pointer() {
        let mut buf = header(1, 1);
        question_example_com(&mut buf);
        buf.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
        buf.extend_from_slice(&300u32.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x04, 93, 184, 216, 34]);

        let message = decode(&buf).unwrap();
        assert_eq!(message.id(), 0x1234);
        assert!(message.header.response);
        assert_eq!(message.answers.len(), 1);
        assert_eq!(message.answers[0].name.to_string(), "example.com");
        assert_eq!(message.answers[0].ttl, 300);
        assert_eq!(
            message.answers[0].data,
            RData::A(Ipv4Addr::new(93, 184, 216, 34))
        );
    }

    #[test]
    fn test_decode_rejects_forward_pointer() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0xC0, 0x20, 0x00, 0x01, 0x00, 0x01]);
        buf.resize(40, 0);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_rejects_self_pointer() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_rejects_pointer_loop() {
        let mut buf = header(1, 0);
        // label "a" at 12, then a pointer back to 12 at 14
        buf.extend_from_slice(&[0x01, b'a', 0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_rejects_reserved_label_type() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0x41, b'a', 0x00, 0x00, 0x01, 0x00, 0x01]);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_rejects_count_past_end() {
        let mut buf = header(2, 0);
        question_example_com(&mut buf);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_rejects_rdlength_mismatch() {
        let mut buf = header(1, 1);
        question_example_com(&mut buf);
        buf.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
        buf.extend_from_slice(&60u32.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x05, 1, 2, 3, 4, 5]);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_rejects_name_over_255_octets() {
        let mut buf = header(1, 0);
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(0);
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        assert!(matches!(decode(&buf), Err(DomainError::FormatError(_))));
    }

    #[test]
    fn test_decode_keeps_unknown_type_opaque() {
        let mut buf = header(0, 1);
        buf.extend_from_slice(&[0x00, 0x00, 0x63, 0x00, 0x01]);
        buf.extend_from_slice(&10u32.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x03, 0xAA, 0xBB, 0xCC]);

        let message = decode(&buf).unwrap();
        assert_eq!(message.answers[0].record_type, RecordType::Unknown(99));
        assert_eq!(
            message.answers[0].data,
            RData::Other(vec![0xAA, 0xBB, 0xCC].into_boxed_slice())
        );
    }
}
