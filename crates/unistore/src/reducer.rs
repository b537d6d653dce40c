//! Reducers - pure functions that produce the next state

use std::sync::Arc;

/// A reducer: `(action, state?) -> state`
///
/// The state is absent only for the first reduction of a store that was
/// created without initial state. Reducers must be total and must never
/// dispatch into the store that is running them.
pub type Reducer<S, A> = Arc<dyn Fn(&A, Option<&S>) -> S + Send + Sync>;

/// Wrap a function or closure into a [`Reducer`]
pub fn reducer<S, A, F>(f: F) -> Reducer<S, A>
where
    F: Fn(&A, Option<&S>) -> S + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Chain several reducers into one
///
/// Reducers run in order for every action. The first one receives the
/// store's state, each following one receives the state produced by its
/// predecessor.
///
/// # Panics
///
/// Panics if `reducers` is empty, since there is nothing to produce a state.
pub fn combine_reducers<S, A>(reducers: Vec<Reducer<S, A>>) -> Reducer<S, A>
where
    S: 'static,
    A: 'static,
{
    let mut reducers = reducers.into_iter();
    let Some(first) = reducers.next() else {
        panic!("combine_reducers needs at least one reducer");
    };
    let rest: Vec<_> = reducers.collect();

    Arc::new(move |action: &A, state: Option<&S>| {
        rest.iter()
            .fold(first(action, state), |state, r| r(action, Some(&state)))
    })
}
