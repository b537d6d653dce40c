//! Ordered delivery of state changes to subscribers
//!
//! Reductions push a [`Notification`] while they still hold the reduction
//! lock, so the queue holds changes in the order they were produced.
//! Whichever caller finds the queue idle drains it. Everybody else only
//! enqueues and returns, the active drainer delivers their notifications
//! after its own. A subscriber that dispatches from its callback therefore
//! never sees the nested change before the one it is handling.

use crate::store::lock;
use crate::subscriber::AnySubscription;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

/// One state change and the subscriptions registered when it happened
pub(crate) struct Notification<S> {
    subscriptions: Vec<Arc<dyn AnySubscription<S>>>,
    old: Option<Arc<S>>,
    new: Arc<S>,
}

impl<S> Notification<S> {
    pub(crate) fn new(
        subscriptions: Vec<Arc<dyn AnySubscription<S>>>,
        old: Option<Arc<S>>,
        new: Arc<S>,
    ) -> Self {
        Self {
            subscriptions,
            old,
            new,
        }
    }

    /// Initial snapshot for a single new subscription
    pub(crate) fn snapshot(subscription: Arc<dyn AnySubscription<S>>, state: Arc<S>) -> Self {
        Self::new(vec![subscription], None, state)
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    fn deliver(&self) {
        for subscription in &self.subscriptions {
            subscription.notify(self.old.as_ref(), &self.new);
        }
    }
}

struct Pending<S> {
    queue: VecDeque<Notification<S>>,
    draining: bool,
}

/// FIFO of notifications waiting to be delivered
pub(crate) struct NotificationQueue<S> {
    pending: Mutex<Pending<S>>,
}

impl<S> NotificationQueue<S> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                queue: VecDeque::new(),
                draining: false,
            }),
        }
    }

    pub(crate) fn push(&self, notification: Notification<S>) {
        lock(&self.pending).queue.push_back(notification);
    }

    /// Deliver queued notifications in order until the queue is empty
    ///
    /// Returns right away if another call is already draining. Subscribers
    /// run without the queue lock held.
    pub(crate) fn drain(&self) {
        {
            let mut pending = lock(&self.pending);
            if pending.draining {
                return;
            }
            pending.draining = true;
        }

        let _guard = DrainGuard { queue: self };
        loop {
            let notification = {
                let mut pending = lock(&self.pending);
                match pending.queue.pop_front() {
                    Some(notification) => notification,
                    None => {
                        pending.draining = false;
                        return;
                    }
                }
            };
            notification.deliver();
        }
    }
}

/// Releases the queue when a subscriber panics mid-delivery
struct DrainGuard<'a, S> {
    queue: &'a NotificationQueue<S>,
}

impl<S> Drop for DrainGuard<'_, S> {
    fn drop(&mut self) {
        if thread::panicking() {
            lock(&self.queue.pending).draining = false;
        }
    }
}
