//! # Service Messages
//!
//! Requests sent from [`MailServiceClient`](super::MailServiceClient) to the
//! [`MailService`](super::MailService) actor. Every request carries a oneshot
//! sender for its reply.
//!
//! Authenticated requests carry the rendered `Authorization` value, just as a
//! real HTTP request would carry the header.

use crate::error::TransportError;
use crate::model::{EventBatch, Mailbox};
use crate::transport::Subscription;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the service.
pub type Response<T> = oneshot::Sender<Result<T, TransportError>>;

#[derive(Debug)]
pub enum ServiceRequest {
    CreateMailbox {
        authorization: String,
        name: Option<String>,
        respond_to: Response<Mailbox>,
    },
    Simulate {
        authorization: String,
        address: Mailbox,
        subject: String,
        respond_to: Response<Mailbox>,
    },
    Fetch {
        authorization: String,
        address: Mailbox,
        respond_to: Response<EventBatch>,
    },
    Subscribe {
        address: Mailbox,
        respond_to: Response<Subscription>,
    },
    ActiveSubscriptions {
        address: Mailbox,
        respond_to: Response<usize>,
    },
}
