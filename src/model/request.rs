use super::{EventRecord, Mailbox};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a candidate email satisfies a wait.
///
/// Runs on the task delivering events, so it must be cheap and must not block.
pub type Predicate = Arc<dyn Fn(&EventRecord) -> bool + Send + Sync>;

/// One wait: which mailbox, what to accept, and for how long.
///
/// ```rust
/// use eta_wait::model::{Mailbox, WaitRequest};
/// use std::time::Duration;
///
/// let mailbox = Mailbox::parse("inbox-1@example.test").unwrap();
/// let request = WaitRequest::new(mailbox)
///     .matching(|email| email.subject == "correct subject line")
///     .timeout(Duration::from_secs(10));
///
/// assert_eq!(request.timeout, Some(Duration::from_secs(10)));
/// ```
#[derive(Clone)]
pub struct WaitRequest {
    pub address: Mailbox,
    pub predicate: Option<Predicate>,
    /// `None` uses the waiter's default timeout.
    pub timeout: Option<Duration>,
}

impl WaitRequest {
    pub fn new(address: Mailbox) -> Self {
        Self {
            address,
            predicate: None,
            timeout: None,
        }
    }

    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&EventRecord) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn with_predicate(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `true` when there is no predicate or the predicate accepts the event.
    pub(crate) fn accepts(&self, event: &EventRecord) -> bool {
        match &self.predicate {
            Some(check) => check(event),
            None => true,
        }
    }
}

impl fmt::Debug for WaitRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitRequest")
            .field("address", &self.address)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
