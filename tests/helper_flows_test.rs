use eta_wait::clients::WaitForEmail;
use eta_wait::config::{Credentials, EtaConfig};
use eta_wait::coordinator::WaitState;
use eta_wait::lifecycle::MailSystem;
use eta_wait::model::{Mailbox, WaitRequest};
use eta_wait::{ActionError, TransportError, WaitError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn configured() -> EtaConfig {
    EtaConfig::default().with_credentials(Credentials::new("test-key", "test-secret"))
}

/// Email sent before anyone listens is still picked up by polling.
#[tokio::test]
async fn test_simulate_then_poll() {
    let system = MailSystem::new(configured());

    let address = system
        .client
        .create_email_address(None)
        .await
        .expect("Failed to create address");
    let sent_to = system
        .client
        .simulate(&address, "hello")
        .await
        .expect("Failed to simulate");
    assert_eq!(sent_to, address);

    let batch = system
        .client
        .wait_poll(&address)
        .await
        .expect("Poll should find the email");
    let emails: Vec<_> = batch.into_iter().collect();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "hello");
    assert_eq!(emails[0].field_str("to"), Some(address.as_str()));

    system.shutdown().await.expect("Shutdown failed");
}

/// Email sent before the wait starts is replayed to the new subscription.
#[tokio::test]
async fn test_simulate_then_wait() {
    let system = MailSystem::new(configured());

    let address = system.client.create_email_address(None).await.unwrap();
    system.client.simulate(&address, "the subject").await.unwrap();

    let email = system
        .client
        .wait(&address, None)
        .await
        .expect("Queued email should be delivered to the wait");
    assert_eq!(email.subject, "the subject");
    assert_eq!(system.service.active_subscriptions(&address).await.unwrap(), 0);

    system.shutdown().await.expect("Shutdown failed");
}

/// Start listening, then trigger the send.
#[tokio::test]
async fn test_wait_then_send() {
    let system = MailSystem::new(configured());
    let address = system.client.create_email_address(None).await.unwrap();

    let mut waiting = system.client.spawn_wait(WaitRequest::new(address.clone()));
    assert_eq!(waiting.listening().await, WaitState::Listening);
    assert_eq!(system.service.active_subscriptions(&address).await.unwrap(), 1);

    system.client.simulate(&address, "welcome").await.unwrap();

    let email = waiting.outcome().await.expect("Wait should match");
    assert_eq!(email.subject, "welcome");
    assert_eq!(system.service.active_subscriptions(&address).await.unwrap(), 0);

    system.shutdown().await.expect("Shutdown failed");
}

/// The convenience method provisions the address, listens, then runs the send.
#[tokio::test]
async fn test_wait_for_email_convenience() {
    let system = MailSystem::new(configured());
    let sender = system.client.clone();

    let email = system
        .client
        .wait_for_email(WaitForEmail::new(move |address: Mailbox| async move {
            sender.simulate(&address, "sent by the action").await
        }))
        .await
        .expect("wait_for_email failed");

    assert_eq!(email.subject, "sent by the action");
    assert!(email.field_str("to").unwrap().ends_with("@eta.test"));

    system.shutdown().await.expect("Shutdown failed");
}

/// Emails rejected by the check are skipped; the wait resolves on the right one.
#[tokio::test]
async fn test_wrong_subject_then_correct_subject() {
    let system = MailSystem::new(configured());
    let sender = system.client.clone();

    let email = system
        .client
        .wait_for_email(
            WaitForEmail::new(move |address: Mailbox| async move {
                sender.simulate(&address, "wrong subject line").await?;
                sender.simulate(&address, "correct subject line").await
            })
            .named("subjects")
            .check(|email| email.subject == "correct subject line"),
        )
        .await
        .expect("wait_for_email failed");

    assert_eq!(email.subject, "correct subject line");
    assert_eq!(email.field_str("to"), Some("subjects@eta.test"));

    system.shutdown().await.expect("Shutdown failed");
}

/// A slow send is fine as long as it lands before the deadline.
#[tokio::test(start_paused = true)]
async fn test_delayed_send_within_timeout() {
    let system = MailSystem::new(configured().with_wait_timeout(Duration::from_secs(30)));
    let sender = system.client.clone();
    let started = Instant::now();

    let email = system
        .client
        .wait_for_email(WaitForEmail::new(move |address: Mailbox| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            sender.simulate(&address, "late but in time").await
        }))
        .await
        .expect("wait_for_email failed");

    assert_eq!(email.subject, "late but in time");
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(started.elapsed() < Duration::from_secs(30));

    system.shutdown().await.expect("Shutdown failed");
}

/// Nothing sent: the wait fails with a timeout carrying the configured budget.
#[tokio::test(start_paused = true)]
async fn test_wait_times_out_when_nothing_arrives() {
    let system = MailSystem::new(configured().with_wait_timeout(Duration::from_secs(2)));
    let address = system.client.create_email_address(None).await.unwrap();

    let result = system.client.wait(&address, None).await;

    assert!(matches!(result, Err(WaitError::Timeout(d)) if d == Duration::from_secs(2)));
    assert_eq!(system.service.active_subscriptions(&address).await.unwrap(), 0);

    system.shutdown().await.expect("Shutdown failed");
}

/// Without credentials every authenticated helper fails before any I/O, and
/// the send action never runs.
#[tokio::test]
async fn test_missing_credentials_fail_fast() {
    let system = MailSystem::new(EtaConfig::default());
    let address = Mailbox::parse("someone@eta.test").unwrap();

    let created = system.client.create_email_address(None).await;
    assert!(matches!(
        created,
        Err(WaitError::Unauthenticated {
            operation: "create_email_address"
        })
    ));

    let simulated = system.client.simulate(&address, "subject").await;
    assert!(matches!(
        simulated,
        Err(WaitError::Unauthenticated { operation: "simulate" })
    ));

    let polled = system.client.wait_poll(&address).await;
    assert!(matches!(
        polled,
        Err(WaitError::Unauthenticated { operation: "wait_poll" })
    ));

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let result = system
        .client
        .wait_for_email(WaitForEmail::new(move |_address: Mailbox| async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, WaitError>(())
        }))
        .await;
    assert!(matches!(result, Err(WaitError::Unauthenticated { .. })));
    assert!(!ran.load(Ordering::SeqCst), "Action must not run");

    system.shutdown().await.expect("Shutdown failed");
}

/// A failing action fails the operation and releases the subscription.
#[tokio::test]
async fn test_action_failure_wins() {
    let system = MailSystem::new(configured());
    let address = system.client.create_email_address(Some("failing")).await.unwrap();

    let result = system
        .client
        .waiter()
        .wait_with_action(WaitRequest::new(address.clone()), |_address| async {
            Err::<(), _>("smtp relay refused")
        })
        .await;

    match result {
        Err(WaitError::ActionFailure(e)) => assert_eq!(e.to_string(), "smtp relay refused"),
        other => panic!("Expected ActionFailure, got {other:?}"),
    }
    assert_eq!(system.service.active_subscriptions(&address).await.unwrap(), 0);

    system.shutdown().await.expect("Shutdown failed");
}

/// The action fails after the email already matched: the failure still wins.
#[tokio::test(start_paused = true)]
async fn test_action_failure_after_match_wins() {
    let system = MailSystem::new(configured());
    let sender = system.client.clone();

    let result = system
        .client
        .wait_for_email(
            WaitForEmail::new(move |address: Mailbox| async move {
                sender.simulate(&address, "hit").await?;
                tokio::time::sleep(Duration::from_secs(1)).await;
                Err::<(), ActionError>("late failure".into())
            })
            .named("late")
            .check(|email| email.subject == "hit"),
        )
        .await;

    match result {
        Err(WaitError::ActionFailure(e)) => assert_eq!(e.to_string(), "late failure"),
        other => panic!("Expected ActionFailure, got {other:?}"),
    }
    let address = Mailbox::parse("late@eta.test").unwrap();
    assert_eq!(system.service.active_subscriptions(&address).await.unwrap(), 0);

    system.shutdown().await.expect("Shutdown failed");
}

/// A zero poll interval cannot stall polling: the budget still runs out.
#[tokio::test(start_paused = true)]
async fn test_zero_poll_interval_still_times_out() {
    let system = MailSystem::new(
        configured()
            .with_wait_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::ZERO),
    );
    let address = system.client.create_email_address(None).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(60), system.client.wait_poll(&address))
        .await
        .expect("Polling must finish within its budget");

    assert!(matches!(result, Err(WaitError::Timeout(d)) if d == Duration::from_millis(200)));

    system.shutdown().await.expect("Shutdown failed");
}

/// Errors from the service reach the caller unchanged.
#[tokio::test]
async fn test_service_errors_pass_through() {
    let system = MailSystem::new(configured());
    let ghost = Mailbox::parse("ghost@eta.test").unwrap();

    let waited = system.client.wait(&ghost, None).await;
    assert!(matches!(
        waited,
        Err(WaitError::Transport(TransportError::Status { status: 404, .. }))
    ));

    system.client.create_email_address(Some("taken")).await.unwrap();
    let duplicate = system.client.create_email_address(Some("taken")).await;
    assert!(matches!(
        duplicate,
        Err(WaitError::Transport(TransportError::Status { status: 409, .. }))
    ));

    system.shutdown().await.expect("Shutdown failed");
}

/// The service stops once the system and every clone of its client are gone.
#[tokio::test]
async fn test_shutdown_after_waits_settle() {
    let system = MailSystem::new(configured());
    let address = system.client.create_email_address(None).await.unwrap();

    let handle = system
        .client
        .spawn_wait(WaitRequest::new(address).timeout(Duration::from_millis(10)));
    let result = handle.outcome().await;
    assert!(result.unwrap_err().is_timeout());

    system.shutdown().await.expect("Shutdown failed");
}
