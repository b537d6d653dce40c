//! Subscribers and the boxes that bind them to a store
//!
//! The store never owns its subscribers. Each registration is kept as a
//! [`SubscriptionBox`] holding a weak reference; once the subscriber is
//! dropped the box is pruned on the next state change.

use crate::subscription::Subscription;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Receives state (or a projection of it) after every forwarded transition
pub trait StoreSubscriber<T>: Send + Sync {
    fn new_state(&self, state: &T);
}

/// Adapts a closure into a [`StoreSubscriber`]
///
/// ```rust
/// use std::sync::Arc;
/// use unistore::FnSubscriber;
///
/// let subscriber = Arc::new(FnSubscriber::new(|count: &i32| println!("count = {count}")));
/// ```
pub struct FnSubscriber<T, F> {
    callback: F,
    _state: PhantomData<fn(&T)>,
}

impl<T, F> FnSubscriber<T, F>
where
    F: Fn(&T) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _state: PhantomData,
        }
    }
}

impl<T, F> StoreSubscriber<T> for FnSubscriber<T, F>
where
    F: Fn(&T) + Send + Sync,
{
    fn new_state(&self, state: &T) {
        (self.callback)(state)
    }
}

/// Identity of a subscriber, derived from its allocation address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

impl SubscriberId {
    pub fn of<Sub: ?Sized>(subscriber: &Sub) -> Self {
        Self(std::ptr::from_ref(subscriber).cast::<()>() as usize)
    }
}

/// Type-erased view of a subscription box, as stored by the store
pub(crate) trait AnySubscription<S>: Send + Sync {
    fn id(&self) -> SubscriberId;

    /// False once the subscriber has been dropped
    fn is_alive(&self) -> bool;

    fn notify(&self, old: Option<&Arc<S>>, new: &Arc<S>);
}

/// Pairs a subscription pipeline with a weakly held subscriber
pub(crate) struct SubscriptionBox<S, T, Sub: ?Sized> {
    id: SubscriberId,
    subscription: Subscription<S, T>,
    subscriber: Weak<Sub>,
}

impl<S, T, Sub> SubscriptionBox<S, T, Sub>
where
    Sub: StoreSubscriber<T> + ?Sized,
{
    pub(crate) fn new(subscriber: &Arc<Sub>, subscription: Subscription<S, T>) -> Self {
        Self {
            id: SubscriberId::of(&**subscriber),
            subscription,
            subscriber: Arc::downgrade(subscriber),
        }
    }
}

impl<S, T, Sub> AnySubscription<S> for SubscriptionBox<S, T, Sub>
where
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
    Sub: StoreSubscriber<T> + ?Sized,
{
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.subscriber.strong_count() > 0
    }

    fn notify(&self, old: Option<&Arc<S>>, new: &Arc<S>) {
        let Some(subscriber) = self.subscriber.upgrade() else {
            return;
        };
        if let Some(transition) = self.subscription.evaluate(old, new) {
            subscriber.new_state(&transition.new);
        }
    }
}
