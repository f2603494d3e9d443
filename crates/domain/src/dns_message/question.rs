use super::Name;
use crate::dns_record::{RecordClass, RecordType};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub record_type: RecordType,
    pub class: RecordClass,
}

impl Question {
    pub fn new(name: Name, record_type: RecordType) -> Self {
        Self {
            name,
            record_type,
            class: RecordClass::IN,
        }
    }

    /// Equality used for caching, deduplication and upstream echo checks.
    pub fn matches(&self, other: &Question) -> bool {
        self.record_type == other.record_type
            && self.class == other.class
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.record_type)
    }
}
