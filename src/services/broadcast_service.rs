use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::debug;

/// Pending snapshots each subscriber may hold before new ones are dropped.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 5;

/// Process-unique subscriber id. Never reused, even after removal.
pub type SubscriptionId = u64;

/// Registry of live snapshot subscribers.
///
/// Delivery is best effort: `publish` never waits on a subscriber. When a
/// subscriber's buffer is full the snapshot is dropped for that subscriber
/// only. Snapshots carry the full menu, so the next one that fits brings it
/// back up to date.
///
/// Snapshots are published with the store's write sequence number. One that
/// is not newer than the last published snapshot is stale and is dropped, so
/// subscribers always see snapshots in write order.
#[derive(Debug)]
pub struct Broadcaster {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
    buffer: usize,
}

#[derive(Debug, Default)]
struct Registry {
    subscribers: HashMap<SubscriptionId, mpsc::Sender<Bytes>>,
    last_seq: u64,
}

impl Broadcaster {
    /// `buffer` is the per-subscriber queue length; zero is treated as one.
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    pub fn buffer(&self) -> usize {
        self.buffer
    }

    /// Register a new subscriber.
    ///
    /// The returned guard unsubscribes when dropped.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel(self.buffer);

        self.registry.lock().subscribers.insert(id, sender);
        debug!(subscription_id = id, "subscriber registered");

        Subscription {
            id,
            receiver,
            broadcaster: Arc::clone(self),
        }
    }

    /// Remove a subscriber and close its channel. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.registry.lock().subscribers.remove(&id).is_some() {
            debug!(subscription_id = id, "subscriber removed");
        }
    }

    /// Offer `snapshot`, written as store write `seq`, to every current
    /// subscriber without blocking.
    ///
    /// Returns how many subscribers accepted it; a stale snapshot reaches
    /// none.
    pub fn publish(&self, seq: u64, snapshot: Bytes) -> usize {
        let mut registry = self.registry.lock();
        if seq <= registry.last_seq {
            debug!(seq, last_seq = registry.last_seq, "stale snapshot dropped");
            return 0;
        }
        registry.last_seq = seq;

        let mut delivered = 0;
        registry.subscribers.retain(|&id, sender| match sender.try_send(snapshot.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(subscription_id = id, "subscriber buffer full, snapshot dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscription_id = id, "pruning subscriber with dropped receiver");
                false
            }
        });

        delivered
    }

    /// Remove every subscriber, closing all channels.
    pub fn close_all(&self) {
        let closed = {
            let mut registry = self.registry.lock();
            let n = registry.subscribers.len();
            registry.subscribers.clear();
            n
        };
        debug!(closed, "all subscribers closed");
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

/// A registered subscriber: its id plus the receiving half of its channel.
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<Bytes>,
    broadcaster: Arc<Broadcaster>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next snapshot, or `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Bytes, TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn broadcaster(buffer: usize) -> Arc<Broadcaster> {
        Arc::new(Broadcaster::new(buffer))
    }

    #[tokio::test]
    async fn ids_increase_and_are_not_reused() {
        let b = broadcaster(1);

        let first = b.subscribe();
        let second = b.subscribe();
        let first_id = first.id();
        drop(first);
        let third = b.subscribe();

        assert!(second.id() > first_id);
        assert!(third.id() > second.id());
        assert_eq!(b.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let b = broadcaster(DEFAULT_SUBSCRIBER_BUFFER);
        let mut a = b.subscribe();
        let mut c = b.subscribe();

        assert_eq!(b.publish(1, Bytes::from_static(b"[]")), 2);

        for sub in [&mut a, &mut c] {
            let got = timeout(Duration::from_millis(100), sub.recv())
                .await
                .expect("delivery timed out");
            assert_eq!(got.as_deref(), Some(&b"[]"[..]));
        }
    }

    #[test]
    fn publish_with_no_subscribers_is_fine() {
        let b = broadcaster(1);
        assert_eq!(b.publish(2, Bytes::from_static(b"[]")), 0);
    }

    #[tokio::test]
    async fn full_buffer_drops_without_blocking_others() {
        let b = broadcaster(2);
        let mut slow = b.subscribe();
        let mut fast = b.subscribe();

        assert_eq!(b.publish(3, Bytes::from_static(b"1")), 2);
        assert_eq!(fast.try_recv().unwrap(), "1");
        assert_eq!(b.publish(4, Bytes::from_static(b"2")), 2);
        assert_eq!(fast.try_recv().unwrap(), "2");

        // slow now holds two pending snapshots, so "3" is dropped for it only
        assert_eq!(b.publish(5, Bytes::from_static(b"3")), 1);
        assert_eq!(fast.try_recv().unwrap(), "3");

        assert_eq!(slow.try_recv().unwrap(), "1");
        assert_eq!(slow.try_recv().unwrap(), "2");
        assert!(matches!(slow.try_recv(), Err(TryRecvError::Empty)));

        // once drained, the next snapshot gets through again
        assert_eq!(b.publish(6, Bytes::from_static(b"4")), 2);
        assert_eq!(slow.try_recv().unwrap(), "4");
        assert_eq!(b.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn unsubscribe_closes_the_channel() {
        let b = broadcaster(DEFAULT_SUBSCRIBER_BUFFER);
        let mut sub = b.subscribe();

        b.unsubscribe(sub.id());
        assert_eq!(b.publish(7, Bytes::from_static(b"[]")), 0);

        assert!(matches!(sub.try_recv(), Err(TryRecvError::Disconnected)));
        assert_eq!(sub.recv().await, None);
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribing_twice_is_a_no_op() {
        let b = broadcaster(1);
        let keep = b.subscribe();
        let sub = b.subscribe();
        let id = sub.id();

        b.unsubscribe(id);
        b.unsubscribe(id);
        drop(sub);

        assert_eq!(b.subscriber_count(), 1);
        assert_eq!(b.publish(8, Bytes::from_static(b"x")), 1);
        drop(keep);
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn dropping_the_subscription_unsubscribes() {
        let b = broadcaster(1);
        {
            let _sub = b.subscribe();
            assert_eq!(b.subscriber_count(), 1);
        }
        assert_eq!(b.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn close_all_ends_every_subscription() {
        let b = broadcaster(1);
        let mut a = b.subscribe();
        let mut c = b.subscribe();

        b.close_all();

        assert_eq!(b.subscriber_count(), 0);
        assert_eq!(a.recv().await, None);
        assert_eq!(c.recv().await, None);
    }

    #[test]
    fn stale_snapshots_are_not_delivered() {
        let b = broadcaster(DEFAULT_SUBSCRIBER_BUFFER);
        let mut sub = b.subscribe();

        assert_eq!(b.publish(2, Bytes::from_static(b"second")), 1);
        assert_eq!(b.publish(1, Bytes::from_static(b"first")), 0);
        assert_eq!(b.publish(2, Bytes::from_static(b"second")), 0);
        assert_eq!(b.publish(3, Bytes::from_static(b"third")), 1);

        assert_eq!(sub.try_recv().unwrap(), "second");
        assert_eq!(sub.try_recv().unwrap(), "third");
        assert!(matches!(sub.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn zero_buffer_is_clamped() {
        let b = broadcaster(0);
        assert_eq!(b.buffer(), 1);
        let _sub = b.subscribe();
        assert_eq!(b.publish(9, Bytes::from_static(b"x")), 1);
    }
}
