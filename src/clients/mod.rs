//! High-level client used by test code.

pub mod eta_client;

pub use eta_client::*;
