use crate::error::WaitError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A disposable email address provisioned by the remote service.
///
/// The value is opaque to this crate. The only rule enforced is that it is not
/// blank, since every transport keys its channels and queues by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mailbox(String);

impl Mailbox {
    pub fn parse(address: impl Into<String>) -> Result<Self, WaitError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(WaitError::InvalidAddress(address));
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Mailbox {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_addresses_are_rejected() {
        assert!(matches!(Mailbox::parse(""), Err(WaitError::InvalidAddress(_))));
        assert!(matches!(Mailbox::parse("  "), Err(WaitError::InvalidAddress(_))));
    }

    #[test]
    fn address_is_kept_verbatim() {
        let mailbox = Mailbox::parse("inbox-1@example.test").unwrap();
        assert_eq!(mailbox.as_str(), "inbox-1@example.test");
        assert_eq!(mailbox.to_string(), "inbox-1@example.test");
        assert_eq!(
            serde_json::to_string(&mailbox).unwrap(),
            "\"inbox-1@example.test\""
        );
    }
}
