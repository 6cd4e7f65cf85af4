//! Plain data passed between the waiter, the transports and the caller.

pub mod event;
pub mod mailbox;
pub mod request;

pub use event::*;
pub use mailbox::*;
pub use request::*;
