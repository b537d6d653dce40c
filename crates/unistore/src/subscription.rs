//! Derived subscriptions over state transitions
//!
//! A [`Subscription`] is a pipeline of typed stages built at subscribe time
//! and evaluated on every state change. Each stage either maps the
//! old/new pair to a projected type ([`select`](Subscription::select)) or
//! decides whether the pair is forwarded at all
//! ([`skip_repeats`](Subscription::skip_repeats), [`only`](Subscription::only)).
//!
//! ```text
//! (old state, new state) → select → skip_repeats → only → subscriber
//! ```
//!
//! Filter stages always forward the first notification, where no previous
//! value exists.
//!
//! # Example
//!
//! ```rust,ignore
//! store.subscribe_with(&subscriber, |subscription| {
//!     subscription
//!         .select(|state: &AppState| state.counter)
//!         .skip_repeats()
//! });
//! ```

use std::sync::Arc;

/// A pair of consecutive values seen by a subscription stage
#[derive(Debug)]
pub struct Transition<T> {
    /// Previous value, absent on the first notification
    pub old: Option<Arc<T>>,
    pub new: Arc<T>,
}

impl<T> Clone for Transition<T> {
    fn clone(&self) -> Self {
        Self {
            old: self.old.clone(),
            new: Arc::clone(&self.new),
        }
    }
}

type Stage<S, T> = Arc<dyn Fn(Option<&Arc<S>>, &Arc<S>) -> Option<Transition<T>> + Send + Sync>;

fn stage<S, T, F>(f: F) -> Stage<S, T>
where
    F: Fn(Option<&Arc<S>>, &Arc<S>) -> Option<Transition<T>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Observer chain from root state `S` to projected value `T`
pub struct Subscription<S, T> {
    stage: Stage<S, T>,
}

impl<S> Subscription<S, S>
where
    S: Send + Sync + 'static,
{
    /// The untransformed subscription: forwards every state as is
    pub fn new() -> Self {
        Self {
            stage: stage(|old: Option<&Arc<S>>, new: &Arc<S>| {
                Some(Transition {
                    old: old.cloned(),
                    new: Arc::clone(new),
                })
            }),
        }
    }
}

impl<S> Default for Subscription<S, S>
where
    S: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Subscription<S, T>
where
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Project both values of every transition through `transform`
    pub fn select<U, F>(self, transform: F) -> Subscription<S, U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let parent = self.stage;
        Subscription {
            stage: stage(move |old: Option<&Arc<S>>, new: &Arc<S>| {
                let transition = parent(old, new)?;
                Some(Transition {
                    old: transition.old.map(|old| Arc::new(transform(&*old))),
                    new: Arc::new(transform(&*transition.new)),
                })
            }),
        }
    }

    /// Drop transitions for which `when(old, new)` holds
    pub fn skip<F>(self, when: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let parent = self.stage;
        Subscription {
            stage: stage(move |old: Option<&Arc<S>>, new: &Arc<S>| {
                let transition = parent(old, new)?;
                let suppressed = transition
                    .old
                    .as_ref()
                    .is_some_and(|old| when(&**old, &*transition.new));
                (!suppressed).then_some(transition)
            }),
        }
    }

    /// Forward only transitions for which `when(old, new)` holds
    pub fn only<F>(self, when: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.skip(move |old, new| !when(old, new))
    }

    /// Drop transitions whose values are equal under `is_equal`
    pub fn skip_repeats_by<F>(self, is_equal: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.skip(is_equal)
    }

    /// Drop transitions whose values compare equal
    pub fn skip_repeats(self) -> Self
    where
        T: PartialEq,
    {
        self.skip(|old, new| old == new)
    }

    /// Run the pipeline for one state change
    ///
    /// Returns `None` when a filter stage suppressed the transition.
    pub fn evaluate(&self, old: Option<&Arc<S>>, new: &Arc<S>) -> Option<Transition<T>> {
        (self.stage)(old, new)
    }
}
