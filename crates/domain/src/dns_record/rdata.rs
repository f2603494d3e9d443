use crate::dns_message::Name;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// Record data. Types the forwarder does not interpret are kept as raw octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(Name),
    CNAME(Name),
    PTR(Name),
    MX { preference: u16, exchange: Name },
    SOA(Soa),
    /// One entry per character-string.
    TXT(Vec<Box<[u8]>>),
    Other(Box<[u8]>),
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(ip) => write!(f, "{}", ip),
            RData::AAAA(ip) => write!(f, "{}", ip),
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => write!(f, "{}", name),
            RData::MX {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RData::SOA(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RData::TXT(strings) => {
                for (i, s) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "\"{}\"", String::from_utf8_lossy(s))?;
                }
                Ok(())
            }
            RData::Other(raw) => {
                write!(f, "\\# {}", raw.len())?;
                for b in raw.iter() {
                    write!(f, " {:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}
