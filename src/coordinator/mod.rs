//! The event-wait coordinator.
//!
//! # Main Components
//!
//! - [`EventWaiter`] - push waits, polling, and wait-while-acting composition
//! - [`WaitHandle`] - a spawned wait that can be observed and cancelled
//! - [`WaitState`] - lifecycle of a single wait request

pub mod handle;
pub mod poll;
pub mod state;
pub mod waiter;

pub use handle::WaitHandle;
pub use state::WaitState;
pub use waiter::{EventWaiter, WaitSettings};
