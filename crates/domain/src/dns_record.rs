pub mod rdata;
pub mod record_class;
pub mod record_type;
pub mod resource_record;

pub use rdata::{RData, Soa};
pub use record_class::RecordClass;
pub use record_type::RecordType;
pub use resource_record::ResourceRecord;
