//! # EtaClient
//!
//! The high-level API test code talks to. It bundles an [`EtaConfig`] with a
//! transport and exposes the helper operations a test needs: provision an
//! address, trigger a simulated send, and wait for the email to arrive.
//!
//! Authenticated operations check for credentials before doing anything and
//! fail fast with [`WaitError::Unauthenticated`]; nothing is retried.

use crate::config::{Credentials, EtaConfig};
use crate::coordinator::{EventWaiter, WaitHandle, WaitSettings};
use crate::error::{ActionError, WaitError};
use crate::model::{EventBatch, EventRecord, Mailbox, Predicate, WaitRequest};
use crate::transport::{PollTransport, ProvisioningClient, PushTransport};
use std::future::Future;
use tracing::{debug, info, instrument};

/// Options for [`EtaClient::wait_for_email`].
pub struct WaitForEmail<F> {
    /// Local part for the fresh address; the service picks one when `None`.
    pub name: Option<String>,
    /// Run once the address exists and the listener is attached.
    pub send: F,
    /// Accept only emails for which this returns `true`.
    pub check: Option<Predicate>,
}

impl<F> WaitForEmail<F> {
    pub fn new(send: F) -> Self {
        Self {
            name: None,
            send,
            check: None,
        }
    }

    pub fn check<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&EventRecord) -> bool + Send + Sync + 'static,
    {
        self.check = Some(std::sync::Arc::new(predicate));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Client for the email test automation helpers.
#[derive(Clone, Debug)]
pub struct EtaClient<T> {
    config: EtaConfig,
    waiter: EventWaiter<T>,
}

impl<T> EtaClient<T> {
    pub fn new(config: EtaConfig, transport: T) -> Self {
        let settings = WaitSettings::from(&config);
        Self {
            config,
            waiter: EventWaiter::new(transport, settings),
        }
    }

    pub fn config(&self) -> &EtaConfig {
        &self.config
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    pub fn waiter(&self) -> &EventWaiter<T> {
        &self.waiter
    }

    fn credentials(&self, operation: &'static str) -> Result<&Credentials, WaitError> {
        self.config
            .credentials
            .as_ref()
            .ok_or(WaitError::Unauthenticated { operation })
    }
}

impl<T: ProvisioningClient> EtaClient<T> {
    /// Provisions a fresh disposable address.
    #[instrument(skip(self))]
    pub async fn create_email_address(&self, name: Option<&str>) -> Result<Mailbox, WaitError> {
        let credentials = self.credentials("create_email_address")?;
        let address = self
            .waiter
            .transport()
            .create_mailbox(credentials, name)
            .await?;
        info!(%address, "Email address created");
        Ok(address)
    }

    /// Has the service deliver a fake email with `subject` to `address`.
    /// Resolves with the address, so calls can be chained.
    #[instrument(skip(self))]
    pub async fn simulate(&self, address: &Mailbox, subject: &str) -> Result<Mailbox, WaitError> {
        let credentials = self.credentials("simulate")?;
        let address = self
            .waiter
            .transport()
            .trigger_simulated_delivery(credentials, address, subject)
            .await?;
        debug!(%address, "Simulated email requested");
        Ok(address)
    }
}

impl<T: PushTransport> EtaClient<T> {
    /// Waits on the push channel with the configured default timeout.
    pub async fn wait(
        &self,
        address: &Mailbox,
        check: Option<Predicate>,
    ) -> Result<EventRecord, WaitError> {
        let request = WaitRequest::new(address.clone()).with_predicate(check);
        self.waiter.wait_for_matching_event(request).await
    }

    /// Full control over the request, timeout included.
    pub async fn wait_for(&self, request: WaitRequest) -> Result<EventRecord, WaitError> {
        self.waiter.wait_for_matching_event(request).await
    }
}

impl<T: PushTransport + Clone + 'static> EtaClient<T> {
    pub fn spawn_wait(&self, request: WaitRequest) -> WaitHandle<EventRecord> {
        self.waiter.spawn_wait(request)
    }
}

impl<T: PollTransport> EtaClient<T> {
    /// Polls `address`, spending at most the configured wait timeout.
    pub async fn wait_poll(&self, address: &Mailbox) -> Result<EventBatch, WaitError> {
        let credentials = self.credentials("wait_poll")?;
        self.waiter
            .poll_for_events(credentials, address, self.config.wait_timeout())
            .await
    }
}

impl<T: ProvisioningClient + PushTransport> EtaClient<T> {
    /// Provisions an address, starts listening on it, then runs `options.send`
    /// with the address. Resolves with the first matching email once the
    /// send action has completed too.
    ///
    /// ```rust,no_run
    /// # use eta_wait::clients::{EtaClient, WaitForEmail};
    /// # use eta_wait::service::MailServiceClient;
    /// # async fn example(eta: EtaClient<MailServiceClient>) -> Result<(), eta_wait::WaitError> {
    /// let email = eta
    ///     .wait_for_email(
    ///         WaitForEmail::new(|address| {
    ///             let eta = eta.clone();
    ///             async move { eta.simulate(&address, "correct subject line").await }
    ///         })
    ///         .check(|email| email.subject == "correct subject line"),
    ///     )
    ///     .await?;
    /// assert_eq!(email.subject, "correct subject line");
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, options))]
    pub async fn wait_for_email<F, Fut, R, E>(
        &self,
        options: WaitForEmail<F>,
    ) -> Result<EventRecord, WaitError>
    where
        F: FnOnce(Mailbox) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Into<ActionError>,
    {
        let address = self.create_email_address(options.name.as_deref()).await?;
        let request = WaitRequest::new(address).with_predicate(options.check);
        self.waiter.wait_with_action(request, options.send).await
    }
}
