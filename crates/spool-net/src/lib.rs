//! Spool networking utilities
//!
//! A UDP message mailbox driven by a caller-owned [`mio`] poll loop, plus
//! small network helpers. The mailbox is a peer of the thread pool in
//! `spool-core`, not a dependency of it.

pub mod mailbox;
pub mod net;

pub use mailbox::{Dispatch, MailBox, MailSender, MsgBuf, MAX_MSG_SIZE};
pub use net::local_ipv4;
