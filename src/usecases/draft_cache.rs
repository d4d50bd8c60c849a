//! Shared single-slot draft holder.

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::mpsc;

use super::{
    contracts::{DataCache, DataSource, DataStream, DataWriter},
    streams::receiver_stream,
};

struct Slot<T> {
    value: Option<T>,
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

/// Replace-on-write cache that replays its latest value to new subscribers.
///
/// Every subscriber observes writes in write order, starting from the value
/// current at subscription time. Subscribers are unbounded and never skip a
/// write, however far behind they fall.
pub struct DraftCache<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone + Send + 'static> DraftCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                subscribers: Vec::new(),
            }),
        }
    }

    pub fn with_value(value: T) -> Self {
        let cache = Self::new();
        cache.write(value);
        cache
    }

    /// Number of subscriptions still being fed.
    pub fn subscriber_count(&self) -> usize {
        self.slot().subscribers.len()
    }

    fn slot(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> Default for DraftCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> DataSource<T> for DraftCache<T> {
    fn data(&self) -> DataStream<T> {
        let (sender, receiver) = mpsc::unbounded_channel();

        // Replay and registration happen under one lock so no write falls
        // between them.
        let mut slot = self.slot();
        if let Some(value) = slot.value.clone() {
            let _ = sender.send(value);
        }
        slot.subscribers.push(sender);
        drop(slot);

        receiver_stream(receiver).map(Ok).boxed()
    }
}

impl<T: Clone + Send + 'static> DataWriter<T> for DraftCache<T> {
    fn write(&self, data: T) {
        let mut slot = self.slot();
        slot.subscribers
            .retain(|subscriber| subscriber.send(data.clone()).is_ok());
        slot.value = Some(data);
    }
}

impl<T: Clone + Send + 'static> DataCache<T> for DraftCache<T> {
    fn current(&self) -> Option<T> {
        self.slot().value.clone()
    }
}
