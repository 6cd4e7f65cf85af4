//! # System Lifecycle
//!
//! Starting, wiring and stopping the simulated environment, plus tracing
//! setup.
//!
//! ## The MailSystem Pattern
//!
//! [`MailSystem`] spawns the [`MailService`](crate::service::MailService)
//! actor and builds an [`EtaClient`](crate::clients::EtaClient) whose
//! transports all point at it:
//!
//! ```rust,ignore
//! impl MailSystem {
//!     pub fn new(config: EtaConfig) -> Self {
//!         let (service_actor, service) = service::new(config.credentials.as_ref());
//!         let handle = tokio::spawn(service_actor.run());
//!         let client = EtaClient::new(config, service.clone());
//!         Self { client, service, handle }
//!     }
//! }
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Drop all service clients** - closes the request channel
//! 2. **The actor detects closure** - `receiver.recv()` returns `None`
//! 3. **Await completion** - the actor task finishes and logs its final size
//!
//! Push subscriptions do not keep the service alive: they hold the receiving
//! side of their own frame channel, not a service client.

pub mod mail_system;
pub mod tracing;

pub use mail_system::*;
pub use tracing::*;
