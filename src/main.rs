//! # eta-wait demo
//!
//! Runs the typical helper flows against the in-memory mail service:
//! 1.  Send to a fresh address, then pick the email up by polling.
//! 2.  Start a push wait, then send.
//! 3.  `wait_for_email` with a send action that first sends the wrong subject.
//!
//! Credentials come from `ETA_API_KEY` / `ETA_API_SECRET` when set; the
//! simulated service is started with whatever the config holds.

use eta_wait::clients::WaitForEmail;
use eta_wait::config::{Credentials, EtaConfig};
use eta_wait::lifecycle::{setup_tracing, MailSystem};
use eta_wait::model::WaitRequest;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let mut config = EtaConfig::from_env().map_err(|e| e.to_string())?;
    if config.credentials.is_none() {
        info!("No ETA_API_KEY / ETA_API_SECRET set, using demo credentials");
        config = config.with_credentials(Credentials::new("demo-key", "demo-secret"));
    }
    info!(api_url = %config.api_url, timeout = ?config.wait_timeout(), "Starting demo");

    let system = MailSystem::new(config);
    let client = system.client.clone();

    let span = tracing::info_span!("send_then_poll");
    async {
        let address = client
            .create_email_address(None)
            .await
            .map_err(|e| e.to_string())?;
        client
            .simulate(&address, "queued for polling")
            .await
            .map_err(|e| e.to_string())?;
        let batch = client.wait_poll(&address).await.map_err(|e| e.to_string())?;
        info!(emails = batch.len(), "Polled emails");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("wait_then_send");
    async {
        let address = client
            .create_email_address(None)
            .await
            .map_err(|e| e.to_string())?;
        let mut waiting = client.spawn_wait(WaitRequest::new(address.clone()));
        waiting.listening().await;
        client
            .simulate(&address, "hello from the demo")
            .await
            .map_err(|e| e.to_string())?;
        let email = waiting.outcome().await.map_err(|e| e.to_string())?;
        info!(subject = %email.subject, "Received email");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("wait_for_email");
    let result = async {
        let sender = client.clone();
        client
            .wait_for_email(
                WaitForEmail::new(move |address| async move {
                    sender.simulate(&address, "wrong subject line").await?;
                    sender.simulate(&address, "correct subject line").await
                })
                .named("demo")
                .check(|email| email.subject == "correct subject line"),
            )
            .await
    }
    .instrument(span)
    .await;

    match result {
        Ok(email) => info!(
            subject = %email.subject,
            id = ?email.field("id"),
            "Matched email"
        ),
        Err(e) => error!(error = %e, "wait_for_email failed"),
    }

    drop(client);
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Demo completed");
    Ok(())
}
