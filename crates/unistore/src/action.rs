//! Actions describe "what happened"
//!
//! Action payloads are opaque to the store. The only thing the store needs
//! from an action type is a way to build the reserved init action, which is
//! dispatched once when a store is created without an initial state.

use std::fmt::Debug;

/// Marker trait for action types accepted by a [`Store`](crate::Store)
///
/// # Example
///
/// ```rust
/// use unistore::Action;
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
/// ```
pub trait Action: Debug + Send + 'static {
    /// The reserved init action
    ///
    /// Reducers receive it together with an absent state and are expected to
    /// produce the default state. Middleware sees it as well.
    fn init() -> Self;
}
