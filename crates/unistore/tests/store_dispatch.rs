//! Dispatch from several threads and tasks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use unistore::{Action, FnSubscriber, Store, StoreSubscriber, reducer};

/// Blocks the reducer until unblocked from the test thread
#[derive(Debug, Default)]
struct Gate {
    value: i32,
    called: AtomicBool,
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn new(value: i32) -> Arc<Self> {
        Arc::new(Self {
            value,
            ..Self::default()
        })
    }

    fn wait(&self) {
        self.called.store(true, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
    }

    fn unblock(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    fn called(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct TestState {
    value: Option<i32>,
}

#[derive(Debug, Clone)]
enum TestAction {
    Init,
    SetValue(i32),
    Delayed(Arc<Gate>),
}

impl Action for TestAction {
    fn init() -> Self {
        TestAction::Init
    }
}

fn test_reducer(action: &TestAction, state: Option<&TestState>) -> TestState {
    let mut state = state.cloned().unwrap_or_default();
    match action {
        TestAction::Init => {}
        TestAction::SetValue(n) => state.value = Some(*n),
        TestAction::Delayed(gate) => {
            gate.wait();
            state.value = Some(gate.value);
        }
    }
    state
}

fn test_store() -> Store<TestState, TestAction> {
    Store::new(
        reducer(test_reducer),
        Some(TestState::default()),
        Vec::new(),
    )
}

fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        thread::yield_now();
    }
    panic!("Timed out waiting for condition to be true");
}

#[test]
fn test_dispatch_in_multiple_threads_is_synchronized() {
    let store = test_store();
    store.dispatch(TestAction::SetValue(5));

    let first = Gate::new(3);
    let second = Gate::new(10);

    thread::scope(|scope| {
        scope.spawn(|| store.dispatch(TestAction::Delayed(Arc::clone(&first))));
        wait_for(|| first.called());

        scope.spawn(|| store.dispatch(TestAction::Delayed(Arc::clone(&second))));
        thread::sleep(Duration::from_millis(20));

        // The second reduction waits for the first to finish
        assert!(!second.called());
        assert_eq!(store.state().unwrap().value, Some(5));

        first.unblock();
        wait_for(|| store.state().unwrap().value == Some(3));

        wait_for(|| second.called());
        assert_eq!(store.state().unwrap().value, Some(3));
        second.unblock();
        wait_for(|| store.state().unwrap().value == Some(10));
    });
}

#[test]
fn test_each_subscriber_sees_every_state_of_serialized_dispatches() {
    let store = Arc::new(test_store());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscriber = Arc::new(FnSubscriber::new(move |state: &TestState| {
        sink.lock().unwrap().push(state.value);
    }));
    store.subscribe(&subscriber);

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store.dispatch(TestAction::SetValue(n * 100 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Initial snapshot plus one notification per reduction
    assert_eq!(seen.lock().unwrap().len(), 1 + 8 * 25);
}

/// Blocks the notifying thread when it sees the gate's value
struct Stalling {
    gate: Arc<Gate>,
    seen: Mutex<Vec<Option<i32>>>,
}

impl StoreSubscriber<TestState> for Stalling {
    fn new_state(&self, state: &TestState) {
        self.seen.lock().unwrap().push(state.value);
        if state.value == Some(self.gate.value) {
            self.gate.wait();
        }
    }
}

#[test]
fn test_subscribers_see_states_in_production_order() {
    let store = test_store();
    let gate = Gate::new(1);
    let slow = Arc::new(Stalling {
        gate: Arc::clone(&gate),
        seen: Mutex::default(),
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let recorder = Arc::new(FnSubscriber::new(move |state: &TestState| {
        sink.lock().unwrap().push(state.value);
    }));
    store.subscribe(&slow);
    store.subscribe(&recorder);

    thread::scope(|scope| {
        let first = scope.spawn(|| store.dispatch(TestAction::SetValue(1)));
        wait_for(|| gate.called());

        // Reduced right away, delivered after the stalled notification
        store.dispatch(TestAction::SetValue(2));
        assert_eq!(store.state().unwrap().value, Some(2));
        assert_eq!(*seen.lock().unwrap(), vec![None]);

        gate.unblock();
        first.join().unwrap();
    });

    assert_eq!(*seen.lock().unwrap(), vec![None, Some(1), Some(2)]);
    assert_eq!(*slow.seen.lock().unwrap(), vec![None, Some(1), Some(2)]);
}

#[test]
fn test_subscribe_snapshot_is_ordered_with_pending_changes() {
    let store = test_store();
    let gate = Gate::new(1);
    let slow = Arc::new(Stalling {
        gate: Arc::clone(&gate),
        seen: Mutex::default(),
    });
    store.subscribe(&slow);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let late = Arc::new(FnSubscriber::new(move |state: &TestState| {
        sink.lock().unwrap().push(state.value);
    }));

    thread::scope(|scope| {
        let first = scope.spawn(|| store.dispatch(TestAction::SetValue(1)));
        wait_for(|| gate.called());

        // Joins after the change to 1 was produced, so it starts from 1
        store.subscribe(&late);
        store.dispatch(TestAction::SetValue(2));
        assert!(seen.lock().unwrap().is_empty());

        gate.unblock();
        first.join().unwrap();
    });

    assert_eq!(*seen.lock().unwrap(), vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn test_accepts_async_action_creators() {
    let store = test_store();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    let subscriber = Arc::new(FnSubscriber::new(move |state: &TestState| {
        if state.value.is_some() {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(state.value);
            }
        }
    }));
    store.subscribe(&subscriber);

    store.dispatch_async(|_, _, emitter| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            emitter.emit(|_, _| Some(TestAction::SetValue(5)));
        });
    });

    let value = tokio::time::timeout(Duration::from_secs(1), rx)
        .await
        .expect("subscriber was not notified")
        .unwrap();
    assert_eq!(value, Some(5));
    assert_eq!(store.state().unwrap().value, Some(5));
}

#[tokio::test]
async fn test_calls_callback_once_async_state_update_is_complete() -> anyhow::Result<()> {
    let store = Arc::new(test_store());
    let (tx, rx) = tokio::sync::oneshot::channel();
    let observer = Arc::clone(&store);

    store.dispatch_async_with_callback(
        |_, _, emitter| {
            tokio::spawn(async move {
                emitter.emit(|_, _| Some(TestAction::SetValue(5)));
            });
        },
        move |state: &TestState| {
            // State already reflects the emitted action
            assert_eq!(observer.state().unwrap().value, Some(5));
            let _ = tx.send(state.value);
        },
    );

    let value = tokio::time::timeout(Duration::from_secs(1), rx).await??;
    assert_eq!(value, Some(5));
    Ok(())
}

#[test]
fn test_emit_from_another_thread() {
    let store = test_store();
    let handle = Mutex::new(None);

    store.dispatch_async(|state, _, emitter| {
        assert_eq!(state.value, None);
        *handle.lock().unwrap() = Some(thread::spawn(move || {
            emitter.emit(|_, _| Some(TestAction::SetValue(42)));
        }));
    });

    handle.lock().unwrap().take().unwrap().join().unwrap();
    assert_eq!(store.state().unwrap().value, Some(42));
}

struct Counter {
    selected: Mutex<Vec<bool>>,
}

impl StoreSubscriber<bool> for Counter {
    fn new_state(&self, is_large: &bool) {
        self.selected.lock().unwrap().push(*is_large);
    }
}

#[test]
fn test_selected_skip_repeats_across_threads() {
    let store = test_store();
    let counter = Arc::new(Counter {
        selected: Mutex::new(Vec::new()),
    });
    store.subscribe_with(&counter, |subscription| {
        subscription
            .select(|state: &TestState| state.value.unwrap_or_default() > 10)
            .skip_repeats()
    });

    thread::scope(|scope| {
        scope.spawn(|| {
            for value in [1, 2, 3, 20, 30, 5] {
                store.dispatch(TestAction::SetValue(value));
            }
        });
    });

    assert_eq!(*counter.selected.lock().unwrap(), vec![false, true, false]);
}
