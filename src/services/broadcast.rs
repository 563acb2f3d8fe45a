//! Subscription fan-out
//!
//! Every subscriber owns a bounded inbox. Publishing pushes a clone of
//! the event into each inbox and returns immediately; when an inbox is
//! full its oldest undelivered event is discarded. A slow consumer loses
//! events, it never slows the publisher down.
//!
//! Besides broadcast, an identity (for instance a driver id) can be bound
//! to one subscription so that targeted notifications reach only that
//! subscriber. Targeted sends to an identity with no live subscription
//! are dropped without error.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Inbox<E> {
    queue: Mutex<VecDeque<E>>,
    capacity: usize,
    closed: AtomicBool,
    dropped: AtomicU64,
    wake: Notify,
}

impl<E> Inbox<E> {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            wake: Notify::new(),
        }
    }

    fn push(&self, event: E) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(event);
        }
        self.wake.notify_one();
    }

    fn pop(&self) -> Option<E> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.queue.lock().pop_front()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.queue.lock().clear();
        self.wake.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

struct HubInner<E> {
    subscribers: DashMap<SubscriptionId, Arc<Inbox<E>>>,
    targets: DashMap<String, SubscriptionId>,
    next_id: AtomicU64,
    capacity: usize,
}

impl<E> HubInner<E> {
    fn remove(&self, id: SubscriptionId) -> bool {
        self.targets.retain(|_, bound| *bound != id);
        match self.subscribers.remove(&id) {
            Some((_, inbox)) => {
                inbox.close();
                true
            }
            None => false,
        }
    }
}

/// Fan-out hub. Cloning shares the same subscriber set.
pub struct BroadcastHub<E> {
    inner: Arc<HubInner<E>>,
}

impl<E> Clone for BroadcastHub<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Clone + Send + 'static> BroadcastHub<E> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// `capacity` is the per-subscriber queue bound (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: DashMap::new(),
                targets: DashMap::new(),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn subscribe(&self) -> Subscription<E> {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let inbox = Arc::new(Inbox::new(self.inner.capacity));
        self.inner.subscribers.insert(id, inbox.clone());
        tracing::debug!(subscription = %id, "Subscribed");

        Subscription {
            id,
            inbox,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every active subscription. Returns how many
    /// inboxes it was queued into.
    pub fn publish(&self, event: E) -> usize {
        let inboxes: Vec<Arc<Inbox<E>>> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for inbox in &inboxes {
            inbox.push(event.clone());
        }
        inboxes.len()
    }

    /// Stop delivering to `id`. Safe to call more than once.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.inner.remove(id) {
            tracing::debug!(subscription = %id, "Unsubscribed");
        }
    }

    /// Bind `key` to a subscription, replacing any earlier binding.
    pub fn register_target(&self, key: &str, id: SubscriptionId) {
        if let Some(previous) = self.inner.targets.insert(key.to_string(), id) {
            if previous != id {
                tracing::debug!(key, old = %previous, new = %id, "Notification target rebound");
            }
        }
    }

    /// Remove the binding for `key` if it still points at `id`.
    pub fn unregister_target(&self, key: &str, id: SubscriptionId) {
        self.inner.targets.remove_if(key, |_, bound| *bound == id);
    }

    /// Deliver `event` only to the subscription bound to `key`.
    /// Returns false when nothing is bound; that is not an error.
    pub fn notify(&self, key: &str, event: E) -> bool {
        let Some(id) = self.inner.targets.get(key).map(|bound| *bound.value()) else {
            tracing::debug!(key, "No live subscription for notification target");
            return false;
        };
        let Some(inbox) = self.inner.subscribers.get(&id).map(|s| s.value().clone()) else {
            return false;
        };
        inbox.push(event);
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn target_count(&self) -> usize {
        self.inner.targets.len()
    }

    pub fn is_target_bound(&self, key: &str) -> bool {
        self.inner.targets.contains_key(key)
    }
}

impl<E: Clone + Send + 'static> Default for BroadcastHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
pub struct Subscription<E> {
    id: SubscriptionId,
    inbox: Arc<Inbox<E>>,
    hub: Weak<HubInner<E>>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next queued event, without waiting.
    pub fn try_recv(&self) -> Option<E> {
        self.inbox.pop()
    }

    /// Wait for the next event. `None` once the subscription is closed.
    pub async fn recv(&self) -> Option<E> {
        loop {
            if let Some(event) = self.inbox.pop() {
                return Some(event);
            }
            if self.inbox.is_closed() {
                return None;
            }
            self.inbox.wake.notified().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    /// Events discarded because this subscriber fell behind.
    pub fn dropped(&self) -> u64 {
        self.inbox.dropped.load(Ordering::Relaxed)
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let hub: BroadcastHub<u32> = BroadcastHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        assert_eq!(hub.publish(7), 2);
        assert_eq!(a.try_recv(), Some(7));
        assert_eq!(b.try_recv(), Some(7));
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let hub: BroadcastHub<u32> = BroadcastHub::new();
        hub.publish(1);
        let sub = hub.subscribe();
        hub.publish(2);
        assert_eq!(sub.try_recv(), Some(2));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_full_inbox_drops_oldest() {
        let hub: BroadcastHub<u32> = BroadcastHub::with_capacity(3);
        let sub = hub.subscribe();
        for i in 0..5 {
            hub.publish(i);
        }
        let received: Vec<u32> = std::iter::from_fn(|| sub.try_recv()).collect();
        assert_eq!(received, vec![2, 3, 4]);
        assert_eq!(sub.dropped(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let hub: BroadcastHub<u32> = BroadcastHub::new();
        let sub = hub.subscribe();
        hub.unsubscribe(sub.id());
        hub.unsubscribe(sub.id());
        assert_eq!(hub.subscriber_count(), 0);
        assert!(sub.is_closed());
    }

    #[test]
    fn test_drop_removes_subscription_and_targets() {
        let hub: BroadcastHub<u32> = BroadcastHub::new();
        let sub = hub.subscribe();
        hub.register_target("driver-1", sub.id());
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
        assert!(!hub.is_target_bound("driver-1"));
    }

    #[test]
    fn test_unregister_ignores_rebound_target() {
        let hub: BroadcastHub<u32> = BroadcastHub::new();
        let old = hub.subscribe();
        let new = hub.subscribe();
        hub.register_target("driver-1", old.id());
        hub.register_target("driver-1", new.id());

        hub.unregister_target("driver-1", old.id());
        assert!(hub.notify("driver-1", 9));
        assert_eq!(new.try_recv(), Some(9));
        assert_eq!(old.try_recv(), None);
    }
}
