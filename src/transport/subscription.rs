//! # Push Subscriptions
//!
//! A [`Subscription`] is the consumer end of a push channel. Transports feed
//! raw frames into an unbounded Tokio channel; the subscription decodes them
//! into [`EventRecord`]s on demand.
//!
//! Releasing the channel is tied to ownership: [`Subscription::close`] closes
//! the receiving half, and `Drop` calls it if nobody did. A transport detects
//! the release through its sender (`is_closed()` / failed `send`), so a waiter
//! that matches, times out, errors, or is simply dropped always frees the
//! channel exactly once.

use crate::error::TransportError;
use crate::model::{EventRecord, Mailbox, PushFrame};
use tokio::sync::mpsc;
use tracing::debug;

/// Sending half handed to whoever produces frames for a subscription.
pub type FrameSender = mpsc::UnboundedSender<String>;

pub struct Subscription {
    address: Mailbox,
    frames: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

impl Subscription {
    /// Creates a subscription and the sender its transport should feed.
    pub fn channel(address: Mailbox) -> (FrameSender, Self) {
        let (sender, frames) = mpsc::unbounded_channel();
        let subscription = Self {
            address,
            frames,
            closed: false,
        };
        (sender, subscription)
    }

    pub fn address(&self) -> &Mailbox {
        &self.address
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Waits for the next frame and decodes it.
    ///
    /// Fails with [`TransportError::ChannelClosed`] when the remote side has
    /// gone away (or after [`close`](Self::close)), and with
    /// [`TransportError::Decode`] for a frame that is not a valid envelope.
    pub async fn next_event(&mut self) -> Result<EventRecord, TransportError> {
        if self.closed {
            return Err(TransportError::ChannelClosed);
        }
        let raw = self
            .frames
            .recv()
            .await
            .ok_or(TransportError::ChannelClosed)?;
        Ok(PushFrame::decode(&raw)?)
    }

    /// Releases the channel. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.frames.close();
        debug!(address = %self.address, "Push subscription closed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("address", &self.address)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox() -> Mailbox {
        Mailbox::parse("inbox@example.test").unwrap()
    }

    #[tokio::test]
    async fn decodes_frames_in_order() {
        let (sender, mut subscription) = Subscription::channel(mailbox());
        sender.send(r#"{"data":{"subject":"one"}}"#.into()).unwrap();
        sender.send(r#"{"data":{"subject":"two"}}"#.into()).unwrap();

        assert_eq!(subscription.next_event().await.unwrap().subject, "one");
        assert_eq!(subscription.next_event().await.unwrap().subject, "two");
    }

    #[tokio::test]
    async fn remote_hangup_is_reported() {
        let (sender, mut subscription) = Subscription::channel(mailbox());
        drop(sender);
        assert!(matches!(
            subscription.next_event().await,
            Err(TransportError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn malformed_frame_is_a_decode_error() {
        let (sender, mut subscription) = Subscription::channel(mailbox());
        sender.send("{".into()).unwrap();
        assert!(matches!(
            subscription.next_event().await,
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn close_and_drop_release_the_sender() {
        let (sender, mut subscription) = Subscription::channel(mailbox());
        assert!(!sender.is_closed());
        subscription.close();
        subscription.close();
        assert!(sender.is_closed());
        assert!(subscription.is_closed());

        let (sender, subscription) = Subscription::channel(mailbox());
        drop(subscription);
        assert!(sender.is_closed());
    }
}
