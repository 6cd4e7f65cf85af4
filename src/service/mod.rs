//! In-memory simulated mail service.

pub mod actor;
pub mod client;
pub mod message;

pub use actor::{MailService, MAX_QUEUED};
pub use client::MailServiceClient;
pub use message::ServiceRequest;

use crate::config::Credentials;

/// Domain of addresses provisioned by the simulated service.
pub const SIMULATED_DOMAIN: &str = "eta.test";

/// Creates a new mail service actor and its client.
pub fn new(accepted: Option<&Credentials>) -> (MailService, MailServiceClient) {
    MailService::new(32, SIMULATED_DOMAIN, accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::model::Mailbox;
    use crate::transport::{PollTransport, ProvisioningClient, PushTransport};

    fn credentials() -> Credentials {
        Credentials::new("key", "secret")
    }

    fn start() -> MailServiceClient {
        let (service, client) = new(Some(&credentials()));
        tokio::spawn(service.run());
        client
    }

    #[tokio::test]
    async fn generated_and_named_mailboxes() {
        let client = start();
        let generated = client.create_mailbox(&credentials(), None).await.unwrap();
        let named = client
            .create_mailbox(&credentials(), Some("alice"))
            .await
            .unwrap();

        assert_eq!(generated.as_str(), "inbox-1@eta.test");
        assert_eq!(named.as_str(), "alice@eta.test");

        let duplicate = client.create_mailbox(&credentials(), Some("alice")).await;
        assert!(matches!(
            duplicate,
            Err(TransportError::Status { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let client = start();
        let result = client
            .create_mailbox(&Credentials::new("key", "wrong"), None)
            .await;
        assert!(matches!(result, Err(TransportError::Status { status: 401, .. })));
    }

    #[tokio::test]
    async fn delivery_is_pushed_and_queued() {
        let client = start();
        let address = client.create_mailbox(&credentials(), None).await.unwrap();
        let mut subscription = client.subscribe(&address).await.unwrap();

        let returned = client
            .trigger_simulated_delivery(&credentials(), &address, "the subject")
            .await
            .unwrap();
        assert_eq!(returned, address);

        let pushed = subscription.next_event().await.unwrap();
        assert_eq!(pushed.subject, "the subject");
        assert_eq!(pushed.field_str("to"), Some(address.as_str()));

        let batch = client.fetch(&credentials(), &address).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert!(client.fetch(&credentials(), &address).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_subscription_replays_queued_emails() {
        let client = start();
        let address = client.create_mailbox(&credentials(), None).await.unwrap();
        for subject in ["earlier", "later"] {
            client
                .trigger_simulated_delivery(&credentials(), &address, subject)
                .await
                .unwrap();
        }

        let mut subscription = client.subscribe(&address).await.unwrap();
        assert_eq!(subscription.next_event().await.unwrap().subject, "earlier");
        assert_eq!(subscription.next_event().await.unwrap().subject, "later");

        client.fetch(&credentials(), &address).await.unwrap();
        let mut fresh = client.subscribe(&address).await.unwrap();
        client
            .trigger_simulated_delivery(&credentials(), &address, "newest")
            .await
            .unwrap();
        assert_eq!(fresh.next_event().await.unwrap().subject, "newest");
    }

    #[tokio::test]
    async fn queue_keeps_only_the_newest_emails() {
        let client = start();
        let address = client.create_mailbox(&credentials(), None).await.unwrap();
        for n in 0..=MAX_QUEUED {
            client
                .trigger_simulated_delivery(&credentials(), &address, &format!("email {n}"))
                .await
                .unwrap();
        }

        let batch = client.fetch(&credentials(), &address).await.unwrap();
        assert_eq!(batch.len(), MAX_QUEUED);
        assert_eq!(batch.emails[0].subject, "email 1");
    }

    #[tokio::test]
    async fn unknown_mailbox_is_not_found() {
        let client = start();
        let stranger = Mailbox::parse("nobody@eta.test").unwrap();

        assert!(matches!(
            client.subscribe(&stranger).await,
            Err(TransportError::Status { status: 404, .. })
        ));
        assert!(matches!(
            client
                .trigger_simulated_delivery(&credentials(), &stranger, "hi")
                .await,
            Err(TransportError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn released_subscriptions_are_not_counted() {
        let client = start();
        let address = client.create_mailbox(&credentials(), None).await.unwrap();
        let first = client.subscribe(&address).await.unwrap();
        let _second = client.subscribe(&address).await.unwrap();
        assert_eq!(client.active_subscriptions(&address).await.unwrap(), 2);

        drop(first);
        assert_eq!(client.active_subscriptions(&address).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stopped_service_is_a_request_error() {
        let (service, client) = new(Some(&credentials()));
        drop(service);
        let result = client.create_mailbox(&credentials(), None).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
