use std::sync::Arc;
use std::time::Duration;
use unistore::{FnSubscriber, LoggingMiddleware, Store, StoreConfig, reducer};

mod counter;
mod logger;

use counter::{CounterAction, CounterState, NonNegativeMiddleware};

const CONFIG_FILE: &str = "unistore.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = logger::init();
    log::info!("Starting unistore-demo (log level {})", level);

    let config = StoreConfig::load_or_default(CONFIG_FILE);

    // Middleware runs in the order it is added
    let store = Arc::new(
        Store::builder(reducer(counter::reduce))
            .with_middleware(LoggingMiddleware::from_config(&config))
            .with_middleware(NonNegativeMiddleware)
            .with_config(config)
            .build(),
    );

    let printer = Arc::new(FnSubscriber::new(|state: &CounterState| {
        println!(
            "count = {:>3}  (last change: {:?})",
            state.count, state.last_change
        );
    }));
    store.subscribe(&printer);

    let milestones = Arc::new(FnSubscriber::new(|tens: &i64| {
        println!("reached {} tens", tens);
    }));
    store.subscribe_with(&milestones, |subscription| {
        subscription
            .select(|state: &CounterState| state.count / 10)
            .skip_repeats()
    });

    store.dispatch(CounterAction::Add(4));
    store.dispatch(CounterAction::Add(-2));
    store.dispatch(CounterAction::Add(7));

    // Synchronous action creator: double the count, but only if it is odd
    store.dispatch_creator(|state, _| {
        (state.count % 2 == 1).then_some(CounterAction::Add(state.count))
    });

    // Asynchronous action creator, completed by a timer task
    let (tx, rx) = tokio::sync::oneshot::channel();
    store.dispatch_async_with_callback(
        |_, _, emitter| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                emitter.emit(|state, _| (state.count > 0).then_some(CounterAction::Reset));
            });
        },
        move |state: &CounterState| {
            let _ = tx.send(state.count);
        },
    );

    let count = tokio::time::timeout(Duration::from_secs(1), rx).await??;
    log::info!("Async reset finished, count is {}", count);

    store.unsubscribe(&milestones);
    drop(printer);
    store.dispatch(CounterAction::Add(1));
    log::info!(
        "{} subscription(s) left after dropping the printer",
        store.subscription_count()
    );

    log::info!("Exiting unistore-demo");
    Ok(())
}
