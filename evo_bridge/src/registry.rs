//! Subscriber registry.
//!
//! Each observer owns a bounded queue. Broadcasting never blocks: an event
//! that does not fit in an observer's queue is dropped for that observer
//! only, and a queue whose receiver is gone is pruned. The registry itself
//! is not synchronized; the bridge keeps it behind its state lock so that
//! registration, replay and broadcast are serialized.

use crate::event::BridgeEvent;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::{debug, warn};

/// Opaque subscriber handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end handed to an observer.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    events: mpsc::Receiver<Arc<BridgeEvent>>,
}

impl Subscription {
    /// Handle for [`Bridge::unsubscribe`](crate::bridge::Bridge::unsubscribe).
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event; `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<Arc<BridgeEvent>> {
        self.events.recv().await
    }

    /// Next event without waiting.
    pub fn try_recv(&mut self) -> Result<Arc<BridgeEvent>, TryRecvError> {
        self.events.try_recv()
    }

    /// Drain everything queued right now.
    pub fn drain(&mut self) -> Vec<Arc<BridgeEvent>> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

#[derive(Debug)]
struct Subscriber {
    tx: mpsc::Sender<Arc<BridgeEvent>>,
    dropped: u64,
}

/// Set of connected observers.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: HashMap<SubscriberId, Subscriber>,
    next_id: u64,
    queue_depth: usize,
}

impl SubscriberRegistry {
    /// Empty registry; every observer gets a queue of `queue_depth` events.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 0,
            queue_depth: queue_depth.max(1),
        }
    }

    /// Register a new observer and queue `replay` ahead of any later event.
    ///
    /// Replay events that do not fit in the queue are dropped, so the
    /// queue depth must be at least the replay length.
    pub fn register(&mut self, replay: impl IntoIterator<Item = BridgeEvent>) -> Subscription {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let (tx, events) = mpsc::channel(self.queue_depth);
        for event in replay {
            if tx.try_send(Arc::new(event)).is_err() {
                warn!(subscriber = %id, "Replay exceeds queue depth, event dropped");
            }
        }

        self.subscribers.insert(id, Subscriber { tx, dropped: 0 });
        debug!(subscriber = %id, total = self.subscribers.len(), "Subscriber registered");
        Subscription { id, events }
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, total = self.subscribers.len(), "Subscriber removed");
        }
        removed
    }

    /// Deliver `event` to every observer. Returns how many accepted it.
    pub fn broadcast(&mut self, event: BridgeEvent) -> usize {
        let event = Arc::new(event);
        let mut delivered = 0;

        self.subscribers.retain(|id, sub| match sub.tx.try_send(Arc::clone(&event)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                if sub.dropped == 0 {
                    warn!(subscriber = %id, "Subscriber queue full, dropping events");
                }
                sub.dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber = %id, "Subscriber gone, pruning");
                false
            }
        });

        delivered
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// `true` if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BridgeStatus;

    fn input(text: &str) -> BridgeEvent {
        BridgeEvent::Input(text.to_string())
    }

    fn unwrap_all(events: Vec<Arc<BridgeEvent>>) -> Vec<BridgeEvent> {
        events.into_iter().map(|e| (*e).clone()).collect()
    }

    #[test]
    fn replay_precedes_live_events() {
        let mut registry = SubscriberRegistry::new(8);
        let mut sub = registry.register([
            BridgeEvent::Status(BridgeStatus::Initialized),
            input("old"),
        ]);
        registry.broadcast(input("new"));

        assert_eq!(
            unwrap_all(sub.drain()),
            vec![
                BridgeEvent::Status(BridgeStatus::Initialized),
                input("old"),
                input("new"),
            ]
        );
    }

    #[test]
    fn every_subscriber_sees_every_event_in_order() {
        let mut registry = SubscriberRegistry::new(8);
        let mut a = registry.register([]);
        let mut b = registry.register([]);

        for i in 0..5 {
            assert_eq!(registry.broadcast(input(&i.to_string())), 2);
        }

        let expected: Vec<_> = (0..5).map(|i| input(&i.to_string())).collect();
        assert_eq!(unwrap_all(a.drain()), expected);
        assert_eq!(unwrap_all(b.drain()), expected);
    }

    #[test]
    fn full_queue_drops_without_affecting_others() {
        let mut registry = SubscriberRegistry::new(2);
        let mut slow = registry.register([]);
        let mut fast = registry.register([]);

        registry.broadcast(input("1"));
        registry.broadcast(input("2"));
        assert_eq!(unwrap_all(fast.drain()), vec![input("1"), input("2")]);

        // slow never drained: third event only reaches fast.
        assert_eq!(registry.broadcast(input("3")), 1);
        assert_eq!(unwrap_all(fast.drain()), vec![input("3")]);
        assert_eq!(unwrap_all(slow.drain()), vec![input("1"), input("2")]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let mut registry = SubscriberRegistry::new(4);
        let sub = registry.register([]);
        let _keep = registry.register([]);
        drop(sub);

        assert_eq!(registry.broadcast(input("x")), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = SubscriberRegistry::new(4);
        let mut sub = registry.register([]);
        assert!(registry.remove(sub.id()));
        assert!(!registry.remove(sub.id()));
        assert!(registry.is_empty());

        registry.broadcast(input("late"));
        assert!(sub.drain().is_empty());
        assert!(matches!(sub.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn ids_are_unique() {
        let mut registry = SubscriberRegistry::new(4);
        let a = registry.register([]);
        registry.remove(a.id());
        let b = registry.register([]);
        assert_ne!(a.id(), b.id());
    }
}
