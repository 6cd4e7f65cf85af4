use crate::clients::EtaClient;
use crate::config::EtaConfig;
use crate::service::MailServiceClient;
use tokio::task::JoinError;
use tracing::{error, info};

/// Runs the simulated mail service and an [`EtaClient`] wired to it.
///
/// `MailSystem` is responsible for:
/// - **Lifecycle Management**: starting the service actor and stopping it
/// - **Dependency Wiring**: pointing the client's transports at the service
///
/// The service accepts exactly the credentials found in the config. A config
/// without credentials yields a system where every authenticated call fails,
/// which is how the `Unauthenticated` paths are exercised.
///
/// # Example
///
/// ```rust,no_run
/// use eta_wait::config::{Credentials, EtaConfig};
/// use eta_wait::lifecycle::MailSystem;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("key", "secret");
/// let system = MailSystem::new(EtaConfig::default().with_credentials(credentials));
///
/// let address = system.client.create_email_address(None).await?;
/// system.client.simulate(&address, "the subject").await?;
/// let email = system.client.wait(&address, None).await?;
/// assert_eq!(email.subject, "the subject");
///
/// system.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct MailSystem {
    /// Helper client under test.
    pub client: EtaClient<MailServiceClient>,

    /// Direct handle to the service, for assertions on its state.
    pub service: MailServiceClient,

    handle: tokio::task::JoinHandle<()>,
}

impl MailSystem {
    /// Spawns the service actor and builds the client.
    pub fn new(config: EtaConfig) -> Self {
        let (service_actor, service) = crate::service::new(config.credentials.as_ref());
        let handle = tokio::spawn(service_actor.run());
        let client = EtaClient::new(config, service.clone());

        Self {
            client,
            service,
            handle,
        }
    }

    /// Gracefully shuts down the service.
    ///
    /// Drops both handles so the actor's request channel closes, then waits for
    /// the actor task. Clones still held elsewhere (for example by a pending
    /// [`WaitHandle`](crate::coordinator::WaitHandle)) keep the service alive
    /// until they are dropped as well.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down mail system...");

        drop(self.client);
        drop(self.service);

        if let Err(e) = self.handle.await {
            error!("Mail service task failed: {:?}", e);
            return Err(e);
        }

        info!("Mail system shutdown complete.");
        Ok(())
    }
}
