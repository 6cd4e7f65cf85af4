#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # eta-wait
//!
//! > **Wait for emails in end-to-end tests without sleeping.**
//!
//! A test that exercises a signup flow, a password reset or a notification
//! needs to know when the email it triggered has arrived. This crate
//! provisions disposable addresses, subscribes to their incoming emails, and
//! resolves with the first one that satisfies a predicate, bounded by a
//! deadline.
//!
//! ## 🚀 Core Concepts
//!
//! ### One wait, one outcome
//! Every wait ends exactly once: with the matching email, with
//! [`WaitError::Timeout`], or with the transport error that broke it. Emails
//! rejected by the predicate are logged and dropped; they never fail a wait.
//!
//! ### Listen before you act
//! [`EventWaiter::wait_with_action`](coordinator::EventWaiter::wait_with_action)
//! subscribes first and only then runs the action that sends the email, so a
//! fast mail server cannot beat the listener.
//!
//! ### Push first, poll as fallback
//! Waits ride a push [`Subscription`](transport::Subscription). Where a push
//! channel is not available,
//! [`poll_for_events`](coordinator::EventWaiter::poll_for_events) fetches at a
//! fixed interval until something is queued or the budget runs out.
//!
//! ### Cancellation
//! Dropping a wait future releases its subscription and timer. Waits spawned
//! into their own task return a [`WaitHandle`](coordinator::WaitHandle) with an
//! explicit [`cancel`](coordinator::WaitHandle::cancel).
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! [`WaitError`] separates the caller's mistakes (`Unauthenticated`,
//! `InvalidAddress`) from timing (`Timeout`) and from failures of the
//! collaborators (`Transport`, `ActionFailure`). Transport errors keep their
//! original [`TransportError`] via `#[from]`.
//!
//! ### 2. Transports are traits
//! The waiter is generic over [`PushTransport`](transport::PushTransport),
//! [`PollTransport`](transport::PollTransport) and
//! [`ProvisioningClient`](transport::ProvisioningClient). Tests plug in the
//! scripted doubles from [`transport::mock`] or the in-memory
//! [`MailService`](service::MailService) actor.
//!
//! ### 3. Concurrency Model
//! Waits share nothing. Each owns its subscription and its deadline, so any
//! number of them can run concurrently on independent addresses.
//!
//! ### 4. Observability
//! We use `tracing` everywhere with structured logging. Every wait runs in a
//! span carrying its address. See the [`lifecycle::tracing`] module for
//! details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`coordinator`])
//! - **Role**: Turns a [`WaitRequest`](model::WaitRequest) into one outcome.
//! - **Key items**: [`EventWaiter`](coordinator::EventWaiter),
//!   [`WaitHandle`](coordinator::WaitHandle), [`WaitState`](coordinator::WaitState).
//!
//! ### 2. The Seams ([`transport`])
//! - **Role**: The three traits the engine consumes, plus mocks.
//!
//! ### 3. The Interface ([`clients`])
//! - **Role**: [`EtaClient`](clients::EtaClient) bundles config and transport
//!   into the helpers test code calls: `create_email_address`, `simulate`,
//!   `wait`, `wait_poll` and `wait_for_email`.
//!
//! ### 4. The Simulated Backend ([`service`])
//! - **Role**: An actor that provisions mailboxes, fans simulated emails out
//!   to subscribers and queues them for polling.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! - **Key items**: [`MailSystem`](lifecycle::MailSystem),
//!   [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use eta_wait::config::{Credentials, EtaConfig};
//! use eta_wait::lifecycle::MailSystem;
//! use eta_wait::model::WaitRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EtaConfig::default().with_credentials(Credentials::new("key", "secret"));
//!     let system = MailSystem::new(config);
//!
//!     let address = system.client.create_email_address(None).await?;
//!     let mut waiting = system.client.spawn_wait(
//!         WaitRequest::new(address.clone()).matching(|email| email.subject == "Welcome"),
//!     );
//!     waiting.listening().await;
//!
//!     system.client.simulate(&address, "Welcome").await?;
//!     let email = waiting.outcome().await?;
//!     assert_eq!(email.subject, "Welcome");
//!
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod service;
pub mod transport;

pub use error::{ActionError, ConfigError, TransportError, WaitError};
