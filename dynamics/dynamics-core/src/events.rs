//! Position-updated event dispatch.
//!
//! Subscribers live with the position updater rather than on the bodies, so
//! there is no ownership cycle between bodies and listeners. Emission is
//! buffered: the parallel position phases enqueue handles, and the queue is
//! drained serially at the end of the tick, once per body per tick.

use dynamics_types::BodyHandle;

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(BodyHandle) + Send>;

/// Subscriber list and emission queue for `PositionUpdated`.
#[derive(Default)]
pub struct PositionUpdatedEvents {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
    queued: Vec<BodyHandle>,
}

impl PositionUpdatedEvents {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns an id for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&mut self, listener: impl FnMut(BodyHandle) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Queue a batch of finalized bodies for dispatch.
    pub(crate) fn enqueue(&mut self, handles: impl IntoIterator<Item = BodyHandle>) {
        self.queued.extend(handles);
    }

    /// Drain the queue, notifying every subscriber for each queued body.
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queued);
        for handle in queued {
            for (_, listener) in &mut self.subscribers {
                listener(handle);
            }
        }
    }

    /// Number of emissions waiting for [`dispatch`](Self::dispatch).
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queued.len()
    }
}

impl std::fmt::Debug for PositionUpdatedEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionUpdatedEvents")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.queued.len())
            .finish()
    }
}
