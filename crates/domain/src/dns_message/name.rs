use crate::errors::DomainError;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// A domain name as a sequence of raw labels, root excluded.
///
/// Label case is preserved as received; use [`Name::eq_ignore_ascii_case`] or
/// [`Name::to_lowercase_key`] wherever names are compared for caching.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    labels: SmallVec<[Box<[u8]>; 4]>,
}

impl Name {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_labels<I, L>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut name = Self::root();
        for label in labels {
            name.push_label(label.as_ref())?;
        }
        Ok(name)
    }

    /// Appends a label, enforcing the label and total length limits.
    pub fn push_label(&mut self, label: &[u8]) -> Result<(), DomainError> {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName(
                "empty label inside name".to_string(),
            ));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(DomainError::InvalidDomainName(format!(
                "label of {} bytes exceeds {}",
                label.len(),
                MAX_LABEL_LEN
            )));
        }
        if self.wire_len() + label.len() + 1 > MAX_NAME_LEN {
            return Err(DomainError::InvalidDomainName(format!(
                "name exceeds {} bytes",
                MAX_NAME_LEN
            )));
        }
        self.labels.push(label.into());
        Ok(())
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(|l| l.as_ref())
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Uncompressed wire length including the terminating zero octet.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// Labels from index `from` to the root, used for suffix matching.
    pub fn suffix(&self, from: usize) -> &[Box<[u8]>] {
        &self.labels[from..]
    }

    pub fn eq_ignore_ascii_case(&self, other: &Name) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    pub fn to_ascii_lowercase(&self) -> Name {
        Name {
            labels: self
                .labels
                .iter()
                .map(|l| l.to_ascii_lowercase().into_boxed_slice())
                .collect(),
        }
    }

    /// Normalized presentation form used as a cache and dedup key.
    pub fn to_lowercase_key(&self) -> CompactString {
        let mut key = CompactString::with_capacity(self.wire_len());
        if self.is_root() {
            key.push('.');
            return key;
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                key.push('.');
            }
            for &b in label.iter() {
                write_escaped(&mut key, b.to_ascii_lowercase());
            }
        }
        key
    }
}

fn write_escaped(out: &mut CompactString, b: u8) {
    match b {
        b'.' | b'\\' => {
            out.push('\\');
            out.push(b as char);
        }
        0x21..=0x7e => out.push(b as char),
        _ => {
            out.push('\\');
            out.push_str(&format!("{:03}", b));
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            let mut buf = CompactString::default();
            for &b in label.iter() {
                write_escaped(&mut buf, b);
            }
            f.write_str(&buf)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{}\")", self)
    }
}

impl FromStr for Name {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Name::root());
        }

        let bytes = s.as_bytes();
        let end = if bytes.ends_with(b".") && !bytes.ends_with(b"\\.") {
            bytes.len() - 1
        } else {
            bytes.len()
        };

        let mut name = Name::root();
        let mut label: Vec<u8> = Vec::with_capacity(MAX_LABEL_LEN);
        let mut i = 0;
        while i < end {
            match bytes[i] {
                b'\\' => {
                    let digits = bytes.get(i + 1..i + 4).filter(|d| d.iter().all(u8::is_ascii_digit));
                    if let Some(digits) = digits {
                        let value = digits
                            .iter()
                            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
                        let byte = u8::try_from(value).map_err(|_| {
                            DomainError::InvalidDomainName(format!("bad escape in '{}'", s))
                        })?;
                        label.push(byte);
                        i += 4;
                    } else {
                        let next = bytes.get(i + 1).ok_or_else(|| {
                            DomainError::InvalidDomainName(format!("dangling escape in '{}'", s))
                        })?;
                        label.push(*next);
                        i += 2;
                    }
                }
                b'.' => {
                    name.push_label(&label)?;
                    label.clear();
                    i += 1;
                }
                other => {
                    label.push(other);
                    i += 1;
                }
            }
        }
        name.push_label(&label)?;
        Ok(name)
    }
}
