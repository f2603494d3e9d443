pub mod header;
pub mod message;
pub mod name;
pub mod question;

pub use header::{Header, Opcode, ResponseCode};
pub use message::Message;
pub use name::Name;
pub use question::Question;
