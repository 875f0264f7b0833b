//! Inter-task communication
//!
//! Contains the byte ring buffer, the mail message codec and the mailbox.

pub mod cbuf;
pub mod mailbox;
pub mod msg;

pub use cbuf::OsCbuf;
pub use mailbox::OsMailbox;
pub use msg::{msg_flag, OsMsg, OsMsgType};
