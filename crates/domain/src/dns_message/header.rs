use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Unknown(u8),
}

impl Opcode {
    pub fn to_u8(&self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Unknown(code) => *code & 0x0f,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code & 0x0f {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Unknown(other),
        }
    }
}

/// 4-bit header RCODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Unknown(u8),
}

impl ResponseCode {
    pub fn to_u8(&self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Unknown(code) => *code & 0x0f,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code & 0x0f {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::Unknown(_) => "RCODE",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::Unknown(code) => write!(f, "RCODE{}", code),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Header fields. Section counts are derived from the message body and
/// therefore not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub response: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// Z, AD and CD bits, carried through untouched.
    pub reserved: u8,
    pub response_code: ResponseCode,
}

impl Header {
    pub fn query(id: u16) -> Self {
        Self {
            id,
            response: false,
            opcode: Opcode::Query,
            authoritative: false,
            truncated: false,
            recursion_desired: true,
            recursion_available: false,
            reserved: 0,
            response_code: ResponseCode::NoError,
        }
    }

    pub fn flags(&self) -> u16 {
        let mut flags = 0u16;
        if self.response {
            flags |= 0x8000;
        }
        flags |= u16::from(self.opcode.to_u8()) << 11;
        if self.authoritative {
            flags |= 0x0400;
        }
        if self.truncated {
            flags |= 0x0200;
        }
        if self.recursion_desired {
            flags |= 0x0100;
        }
        if self.recursion_available {
            flags |= 0x0080;
        }
        flags |= u16::from(self.reserved & 0x07) << 4;
        flags |= u16::from(self.response_code.to_u8());
        flags
    }

    pub fn from_parts(id: u16, flags: u16) -> Self {
        Self {
            id,
            response: flags & 0x8000 != 0,
            opcode: Opcode::from_u8(((flags >> 11) & 0x0f) as u8),
            authoritative: flags & 0x0400 != 0,
            truncated: flags & 0x0200 != 0,
            recursion_desired: flags & 0x0100 != 0,
            recursion_available: flags & 0x0080 != 0,
            reserved: ((flags >> 4) & 0x07) as u8,
            response_code: ResponseCode::from_u8((flags & 0x0f) as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_roundtrip() {
        let header = Header {
            id: 0xbeef,
            response: true,
            opcode: Opcode::Query,
            authoritative: false,
            truncated: true,
            recursion_desired: true,
            recursion_available: true,
            reserved: 0b010,
            response_code: ResponseCode::NXDomain,
        };
        assert_eq!(header.flags(), 0x83a3);
        assert_eq!(Header::from_parts(0xbeef, header.flags()), header);
    }

    #[test]
    fn test_standard_response_flags() {
        let header = Header::from_parts(1, 0x8180);
        assert!(header.response);
        assert!(header.recursion_desired);
        assert!(header.recursion_available);
        assert_eq!(header.response_code, ResponseCode::NoError);
    }
}
