//! Unidirectional state container
//!
//! A [`Store`] holds a single state value that only changes by dispatching
//! actions through a pure [`Reducer`]. Dispatched actions flow through an
//! ordered middleware chain first; after each state change every live
//! subscriber is notified through its own [`Subscription`] pipeline.
//!
//! ```text
//! dispatch(action) → Middleware chain → Reducer (serialized) → State → Subscribers
//! ```
//!
//! This crate provides:
//! - [`Store`] / [`StoreBuilder`]: state, dispatch and the subscriber registry
//! - [`Middleware`] and the bundled [`LoggingMiddleware`]
//! - [`Dispatcher`] / [`Emitter`]: weak handles for middleware and action creators
//! - [`Subscription`]: `select`, `skip_repeats`, `only` pipelines
//! - [`StoreConfig`]: TOML-loadable settings

mod action;
pub mod config;
mod dispatcher;
pub mod error;
pub mod middleware;
mod notification;
mod reducer;
mod store;
mod subscriber;
pub mod subscription;

pub use action::Action;
pub use config::StoreConfig;
pub use dispatcher::{DispatchCallback, DispatchFn, Dispatcher, Emitter};
pub use error::StoreError;
pub use middleware::{LoggingMiddleware, Middleware, middleware_fn};
pub use reducer::{Reducer, combine_reducers, reducer};
pub use store::{Store, StoreBuilder};
pub use subscriber::{FnSubscriber, StoreSubscriber, SubscriberId};
pub use subscription::{Subscription, Transition};
