use crate::action::Action;
use crate::config::StoreConfig;
use crate::dispatcher::{DispatchCallback, DispatchFn, Dispatcher, Emitter};
use crate::error::StoreError;
use crate::middleware::{self, Middleware};
use crate::notification::{Notification, NotificationQueue};
use crate::reducer::Reducer;
use crate::subscriber::{AnySubscription, StoreSubscriber, SubscriberId, SubscriptionBox};
use crate::subscription::Subscription;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

/// Redux-style Store that holds application state and dispatches actions
///
/// The Store follows the Redux pattern:
/// - Centralized state management
/// - Actions are dispatched to modify state
/// - Pure reducers handle state transitions
/// - State is immutable (replaced on each action)
/// - Subscribers are notified after every state change
///
/// The store is `Send + Sync`; share it behind an `Arc` (or borrow it from
/// scoped threads) to dispatch from several threads. Reductions are
/// serialized, exactly one runs at a time, and every subscriber sees the
/// resulting states in the order they were produced.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use unistore::{Action, FnSubscriber, Store, reducer};
///
/// #[derive(Debug)]
/// enum CounterAction {
///     Init,
///     Increment,
/// }
///
/// impl Action for CounterAction {
///     fn init() -> Self {
///         CounterAction::Init
///     }
/// }
///
/// let store = Store::new(
///     reducer(|action: &CounterAction, state: Option<&i32>| {
///         let count = state.copied().unwrap_or_default();
///         match action {
///             CounterAction::Init => count,
///             CounterAction::Increment => count + 1,
///         }
///     }),
///     None,
///     Vec::new(),
/// );
///
/// let subscriber = Arc::new(FnSubscriber::new(|count: &i32| println!("count = {count}")));
/// store.subscribe(&subscriber);
/// store.dispatch(CounterAction::Increment);
/// assert_eq!(store.state().as_deref(), Some(&1));
/// ```
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

/// Builder for a [`Store`]
///
/// Middleware is called in the order it was added.
pub struct StoreBuilder<S, A> {
    reducer: Reducer<S, A>,
    state: Option<S>,
    middleware: Vec<Box<dyn Middleware<S, A>>>,
    config: StoreConfig,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub fn new(reducer: Reducer<S, A>) -> Self {
        Self {
            reducer,
            state: None,
            middleware: Vec::new(),
            config: StoreConfig::default(),
        }
    }

    /// Start from `state` instead of dispatching the init action
    pub fn with_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_middleware<M: Middleware<S, A> + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Store<S, A> {
        Store::create(self.reducer, self.state, self.middleware, self.config)
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a new store
    ///
    /// With `state` given it becomes the current state right away, without
    /// reduction or notification. Without it, the init action is dispatched
    /// through the full middleware chain so the reducer can build the
    /// default state.
    pub fn new(
        reducer: Reducer<S, A>,
        state: Option<S>,
        middleware: Vec<Box<dyn Middleware<S, A>>>,
    ) -> Self {
        Self::create(reducer, state, middleware, StoreConfig::default())
    }

    pub fn builder(reducer: Reducer<S, A>) -> StoreBuilder<S, A> {
        StoreBuilder::new(reducer)
    }

    fn create(
        reducer: Reducer<S, A>,
        state: Option<S>,
        middleware: Vec<Box<dyn Middleware<S, A>>>,
        config: StoreConfig,
    ) -> Self {
        let needs_init = state.is_none();
        let middleware_count = middleware.len();

        let inner = Arc::new_cyclic(|store: &Weak<StoreInner<S, A>>| {
            let terminal = {
                let store = store.clone();
                let terminal: DispatchFn<A> = Arc::new(move |action: A| match store.upgrade() {
                    Some(store) => store.reduce(action),
                    None => log::debug!("Store dropped before reducing {:?}", action),
                });
                terminal
            };

            StoreInner {
                reducer,
                state: RwLock::new(state.map(Arc::new)),
                reduce_lock: Mutex::new(()),
                reducing_on: Mutex::new(None),
                dispatch_fn: middleware::compose(middleware, terminal, store),
                subscriptions: Mutex::new(Vec::new()),
                notifications: NotificationQueue::new(),
                config,
            }
        });

        log::debug!(
            "[{}] Store created with {} middleware",
            inner.name(),
            middleware_count
        );

        if needs_init {
            inner.dispatch(A::init());
        }

        Self { inner }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Current state
    ///
    /// Always present after construction, unless middleware swallowed the
    /// init action of a store created without state.
    pub fn state(&self) -> Option<Arc<S>> {
        self.inner.state()
    }

    /// A non-owning handle to this store
    pub fn dispatcher(&self) -> Dispatcher<S, A> {
        Dispatcher::new(Arc::downgrade(&self.inner))
    }

    /// Dispatch an action through middleware chain, then reducer
    pub fn dispatch(&self, action: A) {
        self.inner.dispatch(action);
    }

    /// Dispatch the action produced by a synchronous action creator
    ///
    /// The creator runs immediately with the current state and a handle to
    /// the store. Returning `None` dispatches nothing, so state stays as it
    /// is and no subscriber is notified.
    pub fn dispatch_creator<F>(&self, creator: F)
    where
        F: FnOnce(&S, &Dispatcher<S, A>) -> Option<A>,
    {
        self.inner.run_creator(creator);
    }

    /// Run an asynchronous action creator
    ///
    /// The creator runs immediately and receives an [`Emitter`]. It may move
    /// the emitter to other threads or tasks and call
    /// [`emit`](Emitter::emit) once its external work is done.
    pub fn dispatch_async<F>(&self, creator: F)
    where
        F: FnOnce(&S, &Dispatcher<S, A>, Emitter<S, A>),
    {
        self.inner.run_async(creator, None);
    }

    /// Like [`dispatch_async`](Self::dispatch_async), and call `callback`
    /// with the state after the emitted action has been dispatched
    pub fn dispatch_async_with_callback<F, C>(&self, creator: F, callback: C)
    where
        F: FnOnce(&S, &Dispatcher<S, A>, Emitter<S, A>),
        C: FnOnce(&S) + Send + 'static,
    {
        self.inner.run_async(creator, Some(Box::new(callback)));
    }

    /// Subscribe to every state change
    ///
    /// Subscribing again with the same subscriber replaces its previous
    /// subscription. If the store has a state, the subscriber receives it
    /// before any later change. That happens before `subscribe` returns
    /// unless another thread is delivering notifications at the moment, in
    /// which case that thread delivers it.
    pub fn subscribe<Sub>(&self, subscriber: &Arc<Sub>)
    where
        Sub: StoreSubscriber<S> + ?Sized + 'static,
    {
        self.subscribe_with(subscriber, |subscription| subscription);
    }

    /// Subscribe, skipping notifications where the state did not change
    pub fn subscribe_skipping_repeats<Sub>(&self, subscriber: &Arc<Sub>)
    where
        S: PartialEq,
        Sub: StoreSubscriber<S> + ?Sized + 'static,
    {
        self.subscribe_with(subscriber, |subscription| subscription.skip_repeats());
    }

    /// Subscribe through a derived subscription
    ///
    /// `transform` receives the untransformed subscription and returns the
    /// pipeline the subscriber listens to, e.g.
    /// `|s| s.select(|state| state.count).skip_repeats()`.
    pub fn subscribe_with<Sub, T, F>(&self, subscriber: &Arc<Sub>, transform: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce(Subscription<S, S>) -> Subscription<S, T>,
        Sub: StoreSubscriber<T> + ?Sized + 'static,
    {
        let subscription = transform(Subscription::new());
        let subscription_box: Arc<dyn AnySubscription<S>> =
            Arc::new(SubscriptionBox::new(subscriber, subscription));
        self.inner.add_subscription(subscription_box);
    }

    /// Remove the subscription of `subscriber`; no-op if it has none
    pub fn unsubscribe<Sub: ?Sized>(&self, subscriber: &Arc<Sub>) {
        self.unsubscribe_id(SubscriberId::of(&**subscriber));
    }

    /// Remove a subscription by identity
    ///
    /// Lets a subscriber unsubscribe itself with `SubscriberId::of(self)`.
    pub fn unsubscribe_id(&self, id: SubscriberId) {
        self.inner.remove_subscription(id);
    }

    /// Number of registered subscriptions, including dropped subscribers
    /// that have not been pruned yet
    pub fn subscription_count(&self) -> usize {
        lock(&self.inner.subscriptions).len()
    }
}

/// Shared store internals
///
/// Only [`Store`] holds a strong reference. Middleware, dispatchers and
/// emitters hold weak ones.
pub(crate) struct StoreInner<S, A> {
    config: StoreConfig,
    reducer: Reducer<S, A>,
    state: RwLock<Option<Arc<S>>>,
    /// Serializes reductions
    reduce_lock: Mutex<()>,
    /// Thread currently running the reducer
    reducing_on: Mutex<Option<ThreadId>>,
    /// Middleware chain wrapped around `reduce`
    dispatch_fn: DispatchFn<A>,
    subscriptions: Mutex<Vec<Arc<dyn AnySubscription<S>>>>,
    /// Changes waiting to be delivered, in production order
    notifications: NotificationQueue<S>,
}

impl<S, A> StoreInner<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn state(&self) -> Option<Arc<S>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn dispatch(&self, action: A) {
        (self.dispatch_fn)(action)
    }

    /// Evaluate a synchronous creator, returns whether it dispatched
    pub(crate) fn run_creator<F>(self: &Arc<Self>, creator: F) -> bool
    where
        F: FnOnce(&S, &Dispatcher<S, A>) -> Option<A>,
    {
        let Some(state) = self.state() else {
            log::warn!("[{}] No state yet, skipping action creator", self.name());
            return false;
        };

        let dispatcher = Dispatcher::new(Arc::downgrade(self));
        match creator(&state, &dispatcher) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => {
                log::trace!("[{}] Action creator produced no action", self.name());
                false
            }
        }
    }

    pub(crate) fn run_async<F>(
        self: &Arc<Self>,
        creator: F,
        callback: Option<DispatchCallback<S>>,
    ) where
        F: FnOnce(&S, &Dispatcher<S, A>, Emitter<S, A>),
    {
        let Some(state) = self.state() else {
            log::warn!("[{}] No state yet, skipping async action creator", self.name());
            return;
        };

        let dispatcher = Dispatcher::new(Arc::downgrade(self));
        let emitter = Emitter::new(Arc::downgrade(self), callback);
        creator(&state, &dispatcher, emitter);
    }

    /// Terminal step of the dispatch pipeline
    ///
    /// The reducer runs under `reduce_lock` and the new state is stored before
    /// the lock is released. The change is queued under the same lock and
    /// delivered after it is released, so subscribers may dispatch again and
    /// still see states in the order they were produced.
    fn reduce(&self, action: A) {
        let reducing = self.lock_reduction();
        let (old, new) = {
            let _guard = ReentrancyGuard::enter(&self.reducing_on, thread::current().id());

            let old = self.state();
            let new = Arc::new((self.reducer)(&action, old.as_deref()));
            *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&new));
            (old, new)
        };

        let notification = Notification::new(self.live_subscriptions(), old, new);
        if self.config.log_notifications {
            log::trace!(
                "[{}] Queued notification for {} subscriber(s)",
                self.name(),
                notification.len()
            );
        }
        self.notifications.push(notification);
        drop(reducing);

        log::trace!("[{}] Reduced {:?}", self.name(), action);
        self.notifications.drain();
    }

    /// Take `reduce_lock`, failing loudly if the reducer on this thread
    /// is the caller
    fn lock_reduction(&self) -> MutexGuard<'_, ()> {
        let reentrant = *lock(&self.reducing_on) == Some(thread::current().id());
        if reentrant {
            let err = StoreError::ReentrantDispatch {
                store: self.config.name.clone(),
            };
            log::error!("{}", err);
            panic!("{}", err);
        }
        lock(&self.reduce_lock)
    }

    /// Registered subscriptions after pruning dropped subscribers
    fn live_subscriptions(&self) -> Vec<Arc<dyn AnySubscription<S>>> {
        let mut subscriptions = lock(&self.subscriptions);
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.is_alive());
        let pruned = before - subscriptions.len();
        if pruned > 0 {
            log::debug!("[{}] Pruned {} dropped subscriber(s)", self.name(), pruned);
        }
        subscriptions.clone()
    }

    /// Register `subscription` and queue its initial snapshot
    ///
    /// Both happen under `reduce_lock`, so the snapshot is delivered after
    /// every earlier change and before every later one.
    fn add_subscription(&self, subscription: Arc<dyn AnySubscription<S>>) {
        let reducing = self.lock_reduction();
        {
            let mut subscriptions = lock(&self.subscriptions);
            let id = subscription.id();
            if let Some(index) = subscriptions.iter().position(|s| s.id() == id) {
                log::debug!("[{}] Replacing subscription of {:?}", self.name(), id);
                subscriptions.remove(index);
            }
            subscriptions.push(Arc::clone(&subscription));
        }

        if let Some(state) = self.state() {
            let snapshot = Notification::snapshot(subscription, state);
            self.notifications.push(snapshot);
        }
        drop(reducing);

        self.notifications.drain();
    }

    fn remove_subscription(&self, id: SubscriberId) {
        let mut subscriptions = lock(&self.subscriptions);
        if let Some(index) = subscriptions.iter().position(|s| s.id() == id) {
            subscriptions.remove(index);
        }
    }
}

/// Marks the current thread as reducing until dropped, also on unwind
struct ReentrancyGuard<'a> {
    reducing_on: &'a Mutex<Option<ThreadId>>,
}

impl<'a> ReentrancyGuard<'a> {
    fn enter(reducing_on: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Self {
        *lock(reducing_on) = Some(thread);
        Self { reducing_on }
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        *lock(self.reducing_on) = None;
    }
}

/// A panicking reducer poisons the locks; the data they guard stays valid
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
