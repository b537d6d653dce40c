//! Middleware system
//!
//! Middleware sits between `dispatch` and the reducer. The store folds its
//! middleware list around the reduction step once, at construction, so the
//! middleware at index 0 sees every action first.
//!
//! ```text
//! Action → Middleware[0] → Middleware[1] → … → Reducer → State → Subscribers
//! ```
//!
//! Each middleware can:
//! - Inspect actions and state
//! - Pass an action on, possibly transformed, by calling `next`
//! - Swallow an action by not calling `next`
//! - Dispatch new actions through the full chain via the `Dispatcher`
//! - Defer an action by moving `next` (or the dispatcher) somewhere else
//!
//! ## Example
//!
//! ```rust
//! use unistore::{Action, DispatchFn, Dispatcher, Middleware};
//!
//! struct DropNegative;
//!
//! #[derive(Debug)]
//! enum CounterAction {
//!     Init,
//!     Add(i32),
//! }
//!
//! impl Action for CounterAction {
//!     fn init() -> Self {
//!         CounterAction::Init
//!     }
//! }
//!
//! impl Middleware<i32, CounterAction> for DropNegative {
//!     fn handle(
//!         &self,
//!         action: CounterAction,
//!         _dispatcher: &Dispatcher<i32, CounterAction>,
//!         next: &DispatchFn<CounterAction>,
//!     ) {
//!         if !matches!(action, CounterAction::Add(n) if n < 0) {
//!             next(action);
//!         }
//!     }
//! }
//! ```

use crate::action::Action;
use crate::dispatcher::{DispatchFn, Dispatcher};
use crate::store::StoreInner;
use std::sync::{Arc, Weak};

pub mod logging;

pub use logging::LoggingMiddleware;

/// Middleware trait - intercepts actions before they reach the reducer
///
/// Middleware may run on any thread that dispatches, so it only gets `&self`;
/// keep mutable bookkeeping behind a lock or an atomic.
pub trait Middleware<S, A>: Send + Sync {
    /// Handle an action
    ///
    /// - `action`: The action to process
    /// - `dispatcher`: Re-enters the full chain, and reads the current state
    /// - `next`: The rest of the chain; call it to let the action continue
    fn handle(&self, action: A, dispatcher: &Dispatcher<S, A>, next: &DispatchFn<A>);
}

impl<S, A, F> Middleware<S, A> for F
where
    F: Fn(A, &Dispatcher<S, A>, &DispatchFn<A>) + Send + Sync,
{
    fn handle(&self, action: A, dispatcher: &Dispatcher<S, A>, next: &DispatchFn<A>) {
        self(action, dispatcher, next)
    }
}

/// Turn a closure into middleware
///
/// Only needed to pin down the closure's argument types; any closure of the
/// right shape already implements [`Middleware`].
pub fn middleware_fn<S, A, F>(f: F) -> F
where
    F: Fn(A, &Dispatcher<S, A>, &DispatchFn<A>) + Send + Sync,
{
    f
}

/// Fold `middleware` right-to-left around `terminal`
pub(crate) fn compose<S, A>(
    middleware: Vec<Box<dyn Middleware<S, A>>>,
    terminal: DispatchFn<A>,
    store: &Weak<StoreInner<S, A>>,
) -> DispatchFn<A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    middleware
        .into_iter()
        .rev()
        .fold(terminal, |next, middleware| {
            let dispatcher = Dispatcher::new(store.clone());
            let layer: DispatchFn<A> =
                Arc::new(move |action: A| middleware.handle(action, &dispatcher, &next));
            layer
        })
}
