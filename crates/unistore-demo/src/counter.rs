//! Counter domain used by the demo: state, actions, reducer and middleware

use unistore::{Action, DispatchFn, Dispatcher, Middleware};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterState {
    pub count: i64,
    pub last_change: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounterAction {
    Init,
    Add(i64),
    Reset,
}

impl Action for CounterAction {
    fn init() -> Self {
        CounterAction::Init
    }
}

/// Reducer - pure function that produces new state from current state + action
pub fn reduce(action: &CounterAction, state: Option<&CounterState>) -> CounterState {
    let mut state = state.cloned().unwrap_or_default();
    match action {
        CounterAction::Init => {}
        CounterAction::Add(n) => {
            state.count += n;
            state.last_change = Some(*n);
        }
        CounterAction::Reset => {
            state.last_change = Some(-state.count);
            state.count = 0;
        }
    }
    state
}

/// Middleware that drops negative increments before they reach the reducer
pub struct NonNegativeMiddleware;

impl Middleware<CounterState, CounterAction> for NonNegativeMiddleware {
    fn handle(
        &self,
        action: CounterAction,
        _dispatcher: &Dispatcher<CounterState, CounterAction>,
        next: &DispatchFn<CounterAction>,
    ) {
        if let CounterAction::Add(n) = action {
            if n < 0 {
                log::warn!("NonNegativeMiddleware: dropping Add({})", n);
                return;
            }
        }
        next(action)
    }
}
