//! Non-owning handles back into a store
//!
//! Middleware, action creators and anything else that outlives a single
//! dispatch talk to the store through a [`Dispatcher`]. It holds a weak
//! reference, so it never keeps the store alive. Once the store is dropped
//! every operation becomes a silent no-op.

use crate::action::Action;
use crate::store::StoreInner;
use std::sync::{Arc, Weak};

/// Shape of every layer of the dispatch pipeline
pub type DispatchFn<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Receives the store state once an asynchronous action has been dispatched
pub type DispatchCallback<S> = Box<dyn FnOnce(&S) + Send>;

/// Weak handle that dispatches actions through the full middleware chain
pub struct Dispatcher<S, A> {
    store: Weak<StoreInner<S, A>>,
}

impl<S, A> Clone for Dispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S, A> Dispatcher<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(store: Weak<StoreInner<S, A>>) -> Self {
        Self { store }
    }

    /// Dispatch an action
    ///
    /// The action re-enters the middleware chain from the beginning.
    pub fn dispatch(&self, action: A) {
        match self.store.upgrade() {
            Some(store) => store.dispatch(action),
            None => log::debug!("Dispatcher: store dropped, ignoring {:?}", action),
        }
    }

    /// Evaluate a synchronous action creator against the current state
    ///
    /// Dispatches the returned action, if any.
    pub fn dispatch_creator<F>(&self, creator: F)
    where
        F: FnOnce(&S, &Dispatcher<S, A>) -> Option<A>,
    {
        match self.store.upgrade() {
            Some(store) => {
                store.run_creator(creator);
            }
            None => log::debug!("Dispatcher: store dropped, ignoring action creator"),
        }
    }

    /// Current state, or `None` if the store is gone or has no state yet
    pub fn state(&self) -> Option<Arc<S>> {
        self.store.upgrade().and_then(|store| store.state())
    }

    /// Whether the store this handle points to still exists
    pub fn is_alive(&self) -> bool {
        self.store.strong_count() > 0
    }
}

/// The `emit` callback handed to asynchronous action creators
///
/// Emitting consumes the emitter, so an asynchronous creator can produce at
/// most one downstream dispatch. The emitter can be moved to another thread
/// or task and used whenever the external work completes.
pub struct Emitter<S, A> {
    store: Weak<StoreInner<S, A>>,
    callback: Option<DispatchCallback<S>>,
}

impl<S, A> Emitter<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(
        store: Weak<StoreInner<S, A>>,
        callback: Option<DispatchCallback<S>>,
    ) -> Self {
        Self { store, callback }
    }

    /// Evaluate `creator` against the then-current state and dispatch its action
    ///
    /// If the creator yields an action and a completion callback was given,
    /// the callback receives the state after the dispatch. If it yields
    /// nothing, neither the dispatch nor the callback happens.
    pub fn emit<F>(self, creator: F)
    where
        F: FnOnce(&S, &Dispatcher<S, A>) -> Option<A>,
    {
        let Some(store) = self.store.upgrade() else {
            log::debug!("Emitter: store dropped, ignoring async action");
            return;
        };

        if !store.run_creator(creator) {
            return;
        }

        if let Some(callback) = self.callback {
            match store.state() {
                Some(state) => callback(&state),
                None => log::warn!("[{}] async dispatch finished without state", store.name()),
            }
        }
    }
}
