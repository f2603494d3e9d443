use compact_str::CompactString;
use ferrous_forwarder_domain::{Question, RecordClass, RecordType};

/// Normalized question: lowercase name plus type and class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub class: RecordClass,
}

impl CacheKey {
    #[inline]
    pub fn from_question(question: &Question) -> Self {
        Self {
            name: question.name.to_lowercase_key(),
            record_type: question.record_type,
            class: question.class,
        }
    }
}
