//! Publish/subscribe feeds for block, state and attestation events.
//!
//! Every subscriber owns a bounded queue. Publishing never waits: a subscriber whose queue is
//! full misses the event.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use alloy_primitives::B256;
use parking_lot::Mutex;
use ream_consensus::{attestation::Attestation, beacon_block::SignedBeaconBlock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

pub const DEFAULT_MAX_EVENTS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub enum BlockEvent {
    ReceivedBlock(Arc<SignedBeaconBlock>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateEvent {
    ChainStarted { start_time: u64 },
    Initialized { start_time: u64, state_slot: u64 },
    BlockProcessed { slot: u64, block_root: B256 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttestationEvent {
    Received(Arc<Attestation>),
}

struct FeedInner<T> {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::Sender<T>>,
    closed: bool,
}

pub struct Feed<T> {
    name: &'static str,
    capacity: usize,
    inner: Arc<Mutex<FeedInner<T>>>,
}

impl<T: Clone + Send> Feed<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            inner: Arc::new(Mutex::new(FeedInner {
                next_id: 0,
                subscribers: HashMap::new(),
                closed: false,
            })),
        }
    }

    /// Subscribing to a closed feed yields a subscription that is already at its end.
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        if !inner.closed {
            inner.subscribers.insert(id, sender);
        }
        Subscription {
            id,
            receiver,
            feed: Arc::downgrade(&self.inner),
            unsubscribed: false,
        }
    }

    /// Returns the number of subscribers the event was delivered to.
    pub fn publish(&self, event: T) -> usize {
        let mut inner = self.inner.lock();
        let mut delivered = 0;
        inner
            .subscribers
            .retain(|id, sender| match sender.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    debug!(
                        feed = self.name,
                        subscriber = id,
                        "Subscriber queue full, dropping event"
                    );
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            });
        delivered
    }

    /// Ends every subscription. Subscribers drain what is queued and then observe the end of the
    /// feed.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::Receiver<T>,
    feed: Weak<Mutex<FeedInner<T>>>,
    unsubscribed: bool,
}

impl<T> Subscription<T> {
    /// Waits for the next event. ``None`` means the feed was closed or the subscription ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Removes the subscriber from its feed. Calling it again does nothing.
    pub fn unsubscribe(&mut self) {
        if self.unsubscribed {
            return;
        }
        self.unsubscribed = true;
        if let Some(feed) = self.feed.upgrade() {
            feed.lock().subscribers.remove(&self.id);
        }
        self.receiver.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// The feeds shared by the chain, the RPC streams and the slasher.
pub struct Notifier {
    block_feed: Feed<BlockEvent>,
    state_feed: Feed<StateEvent>,
    attestation_feed: Feed<AttestationEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENTS)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            block_feed: Feed::new("block", capacity),
            state_feed: Feed::new("state", capacity),
            attestation_feed: Feed::new("attestation", capacity),
        }
    }

    pub fn block_feed(&self) -> &Feed<BlockEvent> {
        &self.block_feed
    }

    pub fn state_feed(&self) -> &Feed<StateEvent> {
        &self.state_feed
    }

    pub fn attestation_feed(&self) -> &Feed<AttestationEvent> {
        &self.attestation_feed
    }

    pub fn close(&self) {
        self.block_feed.close();
        self.state_feed.close();
        self.attestation_feed.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(slot: u64) -> StateEvent {
        StateEvent::BlockProcessed {
            slot,
            block_root: B256::repeat_byte(slot as u8),
        }
    }

    #[tokio::test]
    async fn test_publish_preserves_order_per_subscriber() {
        let feed = Feed::new("state", 8);
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();

        for slot in 1..=3 {
            assert_eq!(feed.publish(processed(slot)), 2);
        }

        for slot in 1..=3 {
            assert_eq!(first.recv().await, Some(processed(slot)));
            assert_eq!(second.recv().await, Some(processed(slot)));
        }
    }

    #[test]
    fn test_full_queue_drops_for_slow_subscriber_only() {
        let feed = Feed::new("state", 1);
        let mut slow = feed.subscribe();
        let mut fast = feed.subscribe();

        assert_eq!(feed.publish(processed(1)), 2);
        assert_eq!(fast.try_recv(), Some(processed(1)));
        assert_eq!(feed.publish(processed(2)), 1);

        assert_eq!(slow.try_recv(), Some(processed(1)));
        assert_eq!(slow.try_recv(), None);
        assert_eq!(fast.try_recv(), Some(processed(2)));
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let feed = Feed::new("state", 4);
        let mut subscription = feed.subscribe();
        let _other = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(feed.publish(processed(1)), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let feed = Feed::new("state", 4);
        {
            let _subscription = feed.subscribe();
            assert_eq!(feed.subscriber_count(), 1);
        }
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(processed(1)), 0);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions() {
        let notifier = Notifier::new(4);
        let mut subscription = notifier.state_feed().subscribe();
        notifier.state_feed().publish(StateEvent::ChainStarted { start_time: 7 });

        notifier.close();
        assert_eq!(
            subscription.recv().await,
            Some(StateEvent::ChainStarted { start_time: 7 })
        );
        assert_eq!(subscription.recv().await, None);

        let mut late = notifier.state_feed().subscribe();
        assert_eq!(late.recv().await, None);
        assert_eq!(notifier.state_feed().publish(processed(1)), 0);
    }
}
