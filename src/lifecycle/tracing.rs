//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the
//! `tracing` crate.
//!
//! ## Configuration
//!
//! Output uses the compact format without module paths (`with_target(false)`);
//! spans such as `wait_for_matching_event{address=...}` already say where a
//! line comes from.
//!
//! ## What Gets Traced
//!
//! - **Waits**: subscription opened and closed, each incoming email, predicate
//!   rejections, the match or the timeout
//! - **Polling**: rounds, empty mailboxes (trace level), the final batch
//! - **Simulated service**: mailbox creation, deliveries and their fan-out,
//!   rejected api keys
//!
//! ## Usage Examples
//!
//! ```bash
//! # Matches and timeouts only
//! RUST_LOG=info cargo run
//!
//! # Every incoming email and every predicate rejection
//! RUST_LOG=debug cargo run
//!
//! # Also state transitions and empty polls
//! RUST_LOG=trace cargo run
//!
//! # Only the waiter
//! RUST_LOG=eta_wait::coordinator=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=debug`**, a `wait_for_email` whose send action first sends
//! a wrong subject:
//!
//! ```text
//! INFO wait_for_email:create_email_address: Email address created address=inbox-1@eta.test
//! DEBUG wait_for_email:wait_with_action: Push subscription open address=inbox-1@eta.test
//! INFO Simulated email delivered address=inbox-1@eta.test id=1 pushed=1 queued=1
//! DEBUG wait_for_email:wait_with_action: Incoming email subject=wrong subject line
//! DEBUG wait_for_email:wait_with_action: Predicate rejected email; still waiting subject=wrong subject line rejected=1
//! INFO Simulated email delivered address=inbox-1@eta.test id=2 pushed=1 queued=2
//! DEBUG wait_for_email:wait_with_action: Incoming email subject=correct subject line
//! INFO wait_for_email:wait_with_action: Email matched subject=correct subject line rejected=1
//! DEBUG wait_for_email:wait_with_action: Push subscription closed address=inbox-1@eta.test
//! ```

/// Installs the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
