//! # Service Client
//!
//! Cheap, cloneable handle to a running [`MailService`](super::MailService).
//! It implements every transport trait, so it can stand in for the remote
//! service anywhere a [`ProvisioningClient`], [`PushTransport`] or
//! [`PollTransport`] is expected.

use super::message::{Response, ServiceRequest};
use crate::config::Credentials;
use crate::error::TransportError;
use crate::model::{EventBatch, Mailbox};
use crate::transport::{PollTransport, ProvisioningClient, PushTransport, Subscription};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
pub struct MailServiceClient {
    sender: mpsc::Sender<ServiceRequest>,
}

impl MailServiceClient {
    pub fn new(sender: mpsc::Sender<ServiceRequest>) -> Self {
        Self { sender }
    }

    /// Open push subscriptions of `address` that have not been released.
    pub async fn active_subscriptions(&self, address: &Mailbox) -> Result<usize, TransportError> {
        let address = address.clone();
        self.call(|respond_to| ServiceRequest::ActiveSubscriptions {
            address,
            respond_to,
        })
        .await
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(Response<T>) -> ServiceRequest,
    ) -> Result<T, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| TransportError::Request("mail service closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Request("mail service dropped the request".into()))?
    }
}

#[async_trait]
impl ProvisioningClient for MailServiceClient {
    #[instrument(skip(self, credentials))]
    async fn create_mailbox(
        &self,
        credentials: &Credentials,
        name: Option<&str>,
    ) -> Result<Mailbox, TransportError> {
        debug!("Sending request");
        let authorization = credentials.authorization();
        let name = name.map(str::to_string);
        self.call(|respond_to| ServiceRequest::CreateMailbox {
            authorization,
            name,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, credentials))]
    async fn trigger_simulated_delivery(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
        subject: &str,
    ) -> Result<Mailbox, TransportError> {
        debug!("Sending request");
        let authorization = credentials.authorization();
        let address = address.clone();
        let subject = subject.to_string();
        self.call(|respond_to| ServiceRequest::Simulate {
            authorization,
            address,
            subject,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl PushTransport for MailServiceClient {
    async fn subscribe(&self, address: &Mailbox) -> Result<Subscription, TransportError> {
        let address = address.clone();
        self.call(|respond_to| ServiceRequest::Subscribe {
            address,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl PollTransport for MailServiceClient {
    async fn fetch(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
    ) -> Result<EventBatch, TransportError> {
        let authorization = credentials.authorization();
        let address = address.clone();
        self.call(|respond_to| ServiceRequest::Fetch {
            authorization,
            address,
            respond_to,
        })
        .await
    }
}
