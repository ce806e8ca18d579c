//! Event plumbing shared by registries and bindings.
//!
//! Two delivery styles are used:
//!
//! - [`Observers`] calls handlers synchronously on the thread that raises the
//!   event. Registries use it so bindings can rebind before the call returns.
//! - [`EventBroadcaster`] fans events out over crossbeam channels. Bindings
//!   use it for editor notifications, which are drained on the UI thread.

use crate::id::SubscriptionId;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A list of synchronous event handlers.
pub struct Observers<E> {
    handlers: Mutex<Vec<(SubscriptionId, Handler<E>)>>,
    next_id: AtomicU32,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and return the id needed to remove it.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push((id, Arc::new(handler)));
        }
        id
    }

    /// Remove a handler. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.retain(|(h, _)| *h != id);
        }
    }

    /// Call every handler with `event`.
    ///
    /// Handlers run after the internal lock is released, so a handler may
    /// subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = match self.handlers.lock() {
            Ok(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            Err(_) => return,
        };
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Notifications sent to editors when a binding's child lists change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEvent {
    /// A modifier was added, removed or reordered.
    ModifiersUpdated,
    /// A condition was added, removed or reordered.
    ConditionsUpdated,
}

/// Fans events out to any number of channel receivers.
pub struct EventBroadcaster<E> {
    senders: Vec<Sender<E>>,
}

impl<E> Default for EventBroadcaster<E> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<E: Clone> EventBroadcaster<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new receiver for subsequent events.
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    /// Send `event` to every live receiver, dropping disconnected ones.
    pub fn broadcast(&mut self, event: E) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Disconnect all receivers.
    pub fn close(&mut self) {
        self.senders.clear();
    }

    pub fn receiver_count(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_observers_notify_and_unsubscribe() {
        let observers = Observers::<i32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = observers.subscribe(move |v| {
            h.fetch_add(*v as usize, Ordering::SeqCst);
        });

        observers.notify(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        observers.unsubscribe(id);
        observers.notify(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(observers.is_empty());
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let observers = Arc::new(Observers::<()>::new());
        let weak = Arc::downgrade(&observers);
        let slot = Arc::new(Mutex::new(SubscriptionId::INVALID));
        let slot_in = Arc::clone(&slot);
        let id = observers.subscribe(move |_| {
            if let (Some(obs), Ok(id)) = (weak.upgrade(), slot_in.lock()) {
                obs.unsubscribe(*id);
            }
        });
        *slot.lock().unwrap() = id;

        observers.notify(&());
        assert!(observers.is_empty());
    }

    #[test]
    fn test_broadcaster_prunes_dropped_receivers() {
        let mut broadcaster = EventBroadcaster::new();
        let rx1 = broadcaster.subscribe();
        let rx2 = broadcaster.subscribe();
        drop(rx2);

        broadcaster.broadcast(BindingEvent::ModifiersUpdated);
        assert_eq!(rx1.try_recv().unwrap(), BindingEvent::ModifiersUpdated);
        assert_eq!(broadcaster.receiver_count(), 1);
    }
}
