use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use busify::{
    AnyEvent, AnyHandlerFn, AnyHandlerRef, Dispatcher, DispatcherConfig, Event, EventType,
    HandlerError, HandlerFn, HandlerMode, HandlerRef, Payload,
};
use parking_lot::Mutex;
use tokio::sync::{Barrier, Notify};

#[derive(Debug)]
struct OrderPlaced {
    order_id: String,
    amount: f64,
}

impl Payload for OrderPlaced {
    type Output = String;
}

#[derive(Debug)]
struct UserCreated {
    user_id: String,
}

impl Payload for UserCreated {
    type Output = ();
}

fn order(id: &str, amount: f64) -> Event<OrderPlaced> {
    Event::new(OrderPlaced {
        order_id: id.into(),
        amount,
    })
}

fn user(id: &str) -> Event<UserCreated> {
    Event::new(UserCreated { user_id: id.into() })
}

/// Handler that bumps `hits` once per call.
fn counting<P: Payload>(name: &'static str, hits: &Arc<AtomicUsize>) -> HandlerRef<P> {
    let hits = Arc::clone(hits);
    HandlerFn::arc(name, move |_ev: Event<P>| {
        let hits = Arc::clone(&hits);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    })
}

/// Handler that fails with `msg` after `delay`.
fn failing<P: Payload>(msg: &'static str, delay: Duration) -> HandlerRef<P> {
    HandlerFn::arc(msg, move |_ev: Event<P>| async move {
        tokio::time::sleep(delay).await;
        Err::<(), _>(HandlerError::fail(msg))
    })
}

/// Handler that counts only once every party of `barrier` has arrived.
fn meeting<P: Payload>(
    name: &'static str,
    barrier: &Arc<Barrier>,
    hits: &Arc<AtomicUsize>,
) -> HandlerRef<P> {
    let (barrier, hits) = (Arc::clone(barrier), Arc::clone(hits));
    HandlerFn::arc(name, move |_ev: Event<P>| {
        let (barrier, hits) = (Arc::clone(&barrier), Arc::clone(&hits));
        async move {
            barrier.wait().await;
            hits.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    })
}

/// Dispatches one event to two handlers that only finish once both have started.
async fn assert_handlers_overlap(mode: HandlerMode) {
    let bus = Dispatcher::with_config(DispatcherConfig {
        handler_mode: mode,
        ..DispatcherConfig::default()
    });
    let barrier = Arc::new(Barrier::new(2));
    let hits = Arc::new(AtomicUsize::new(0));
    bus.subscribe::<UserCreated, _>(meeting("first", &barrier, &hits));
    bus.subscribe::<UserCreated, _>(meeting("second", &barrier, &hits));

    let ev = tokio::time::timeout(Duration::from_secs(1), bus.dispatch(user("1")))
        .await
        .expect("handlers ran one after another");

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(!ev.has_error());
}

#[tokio::test]
async fn order_placed_handler_sets_result() {
    let bus = Dispatcher::new();
    bus.subscribe::<OrderPlaced, _>(HandlerFn::arc("ok", |ev: Event<OrderPlaced>| async move {
        ev.set_result("ok".into())?;
        Ok::<_, HandlerError>(())
    }));

    let ev = bus.dispatch(order("X", 10.0)).await;

    assert_eq!(ev.get_result(false, true).unwrap().as_deref(), Some("ok"));
    assert!(!ev.has_error());
    assert_eq!(ev.order_id, "X");
    assert_eq!(ev.amount, 10.0);
}

#[tokio::test]
async fn dispatch_without_handlers_returns_same_pending_event() {
    let bus = Dispatcher::new();
    let ev = order("X", 1.0);

    let back = bus.dispatch(ev.clone()).await;

    assert!(Event::ptr_eq(&ev, &back));
    assert!(!back.is_completed());
    assert!(!back.has_error());
    assert!(back.error().is_none());
}

#[tokio::test]
async fn handlers_receive_the_dispatched_event() {
    let bus = Dispatcher::new();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&received);
    bus.subscribe::<UserCreated, _>(HandlerFn::arc("record", move |ev: Event<UserCreated>| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().push(ev.user_id.clone());
            Ok::<_, HandlerError>(())
        }
    }));

    bus.dispatch(user("123")).await;
    assert_eq!(*received.lock(), ["123"]);
}

#[tokio::test]
async fn one_failing_handler_does_not_stop_the_others() {
    let bus = Dispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));

    bus.subscribe::<UserCreated, _>(counting("a", &hits));
    bus.subscribe::<UserCreated, _>(failing("broken", Duration::ZERO));
    bus.subscribe::<UserCreated, _>(counting("b", &hits));
    bus.subscribe::<UserCreated, _>(counting("c", &hits));

    let ev = bus.dispatch(user("123")).await;

    assert!(ev.has_error());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    let err = ev.get_result(false, true).unwrap_err();
    assert_eq!(err.to_string(), "handler failed: broken");
}

#[tokio::test]
async fn first_failure_follows_registration_order() {
    let bus = Dispatcher::new();
    bus.subscribe::<UserCreated, _>(failing("slow", Duration::from_millis(50)));
    bus.subscribe::<UserCreated, _>(failing("fast", Duration::ZERO));

    let ev = bus.dispatch(user("1")).await;

    let err = ev.error().unwrap();
    assert_eq!(err.to_string(), "handler failed: slow");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_failure_follows_registration_order_in_parallel_mode() {
    let bus = Dispatcher::with_config(DispatcherConfig {
        handler_mode: HandlerMode::Parallel,
        ..DispatcherConfig::default()
    });
    let hits = Arc::new(AtomicUsize::new(0));
    bus.subscribe::<UserCreated, _>(counting("ok", &hits));
    bus.subscribe::<UserCreated, _>(failing("slow", Duration::from_millis(50)));
    bus.subscribe::<UserCreated, _>(failing("fast", Duration::ZERO));

    let ev = bus.dispatch(user("1")).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(ev.error().unwrap().to_string(), "handler failed: slow");
}

#[tokio::test]
async fn concurrent_mode_overlaps_handlers() {
    assert_handlers_overlap(HandlerMode::Concurrent).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parallel_mode_overlaps_handlers() {
    assert_handlers_overlap(HandlerMode::Parallel).await;
}

#[tokio::test]
async fn failure_after_result_keeps_the_value() {
    let bus = Dispatcher::new();
    bus.subscribe::<OrderPlaced, _>(HandlerFn::arc("pay", |ev: Event<OrderPlaced>| async move {
        ev.set_result(format!("paid {}", ev.order_id))?;
        Ok::<_, HandlerError>(())
    }));
    bus.subscribe::<OrderPlaced, _>(failing("audit", Duration::from_millis(10)));

    let ev = bus.dispatch(order("A", 5.0)).await;

    assert!(!ev.has_error());
    assert_eq!(ev.result().unwrap().as_deref(), Some("paid A"));
}

#[tokio::test]
async fn second_set_result_from_handler_is_reported_as_failure() {
    let bus = Dispatcher::new();
    let answer = |value: &'static str| {
        HandlerFn::arc(value, move |ev: Event<OrderPlaced>| async move {
            ev.set_result(value.to_string())?;
            Ok::<_, HandlerError>(())
        })
    };
    bus.subscribe::<OrderPlaced, _>(answer("first"));
    bus.subscribe::<OrderPlaced, _>(answer("second"));

    let ev = bus.dispatch(order("A", 5.0)).await;

    // the losing handler fails, but the event is already completed with a value
    assert_eq!(ev.result().unwrap().as_deref(), Some("first"));
    assert!(!ev.has_error());
}

#[tokio::test]
async fn unsubscribe_stops_future_deliveries() {
    let bus = Dispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = counting::<UserCreated>("h", &hits);

    bus.subscribe::<UserCreated, _>(h.clone());
    bus.dispatch(user("1")).await;
    assert!(bus.unsubscribe::<UserCreated, _>(&h));
    bus.dispatch(user("2")).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!bus.unsubscribe::<UserCreated, _>(&h));
}

#[tokio::test]
async fn unsubscribe_does_not_affect_in_flight_dispatch() {
    let bus = Arc::new(Dispatcher::new());
    let hits = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());

    let slow: HandlerRef<UserCreated> = {
        let (hits, started, gate) = (hits.clone(), started.clone(), gate.clone());
        HandlerFn::arc("slow", move |_ev: Event<UserCreated>| {
            let (hits, started, gate) = (hits.clone(), started.clone(), gate.clone());
            async move {
                started.notify_one();
                gate.notified().await;
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        })
    };
    bus.subscribe::<UserCreated, _>(slow.clone());

    let in_flight = {
        let bus = Arc::clone(&bus);
        tokio::spawn(async move { bus.dispatch(user("1")).await })
    };
    started.notified().await;

    assert!(bus.unsubscribe::<UserCreated, _>(&slow));
    gate.notify_one();
    in_flight.await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    bus.dispatch(user("2")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unsubscribe_all_for_one_type() {
    let bus = Dispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));
    bus.subscribe::<UserCreated, _>(counting("a", &hits));
    bus.subscribe::<UserCreated, _>(counting("b", &hits));
    bus.subscribe::<OrderPlaced, _>(counting("c", &hits));

    assert_eq!(bus.unsubscribe_all(Some(EventType::of::<UserCreated>())), 2);
    bus.dispatch(user("1")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    bus.dispatch(order("1", 1.0)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unsubscribe_all_clears_every_type_and_wildcards() {
    let bus = Dispatcher::new();
    let hits = Arc::new(AtomicUsize::new(0));
    bus.subscribe::<UserCreated, _>(counting("a", &hits));
    bus.subscribe::<OrderPlaced, _>(counting("b", &hits));
    let wild = Arc::clone(&hits);
    bus.subscribe_any(AnyHandlerFn::arc("any", move |_ev: Arc<dyn AnyEvent>| {
        let wild = Arc::clone(&wild);
        async move {
            wild.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    }));

    assert_eq!(bus.unsubscribe_all(None), 3);
    bus.dispatch(user("1")).await;
    bus.dispatch(order("2", 99.99)).await;

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(bus.wildcard_count(), 0);
}

#[tokio::test]
async fn wildcard_handlers_see_every_event() {
    let bus = Dispatcher::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let any = AnyHandlerFn::arc("names", move |ev: Arc<dyn AnyEvent>| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().push(ev.event_type().name());
            Ok::<_, HandlerError>(())
        }
    });
    bus.subscribe_any(any.clone());

    bus.dispatch(user("1")).await;
    bus.dispatch(order("2", 3.0)).await;
    assert!(bus.unsubscribe_any(&any));
    bus.dispatch(user("3")).await;

    assert_eq!(*seen.lock(), ["UserCreated", "OrderPlaced"]);
}

#[tokio::test]
async fn wildcard_handler_can_complete_typed_event() {
    let bus = Dispatcher::new();
    bus.subscribe_any(AnyHandlerFn::arc("answer", |ev: Arc<dyn AnyEvent>| async move {
        if let Some(order) = ev.downcast_ref::<OrderPlaced>() {
            order.set_result(format!("seen {}", order.order_id))?;
        }
        Ok::<_, HandlerError>(())
    }));

    let ev = bus.dispatch(order("W", 1.0)).await;
    assert_eq!(ev.await.unwrap(), "seen W");
}

#[tokio::test]
async fn awaiting_event_while_dispatch_runs() {
    let bus = Arc::new(Dispatcher::new());
    bus.subscribe::<OrderPlaced, _>(HandlerFn::arc("pay", |ev: Event<OrderPlaced>| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        ev.set_result(format!("{}: paid {:.2}", ev.order_id, ev.amount))?;
        Ok::<_, HandlerError>(())
    }));

    let ev = order("ORD-1", 149.99);
    let dispatch = {
        let bus = Arc::clone(&bus);
        let ev = ev.clone();
        tokio::spawn(async move { bus.dispatch(ev).await })
    };

    let (a, b) = tokio::join!(ev.wait(), ev.wait_timeout(Duration::from_secs(1)));
    assert_eq!(a.unwrap(), "ORD-1: paid 149.99");
    assert_eq!(b.unwrap(), "ORD-1: paid 149.99");
    assert_eq!((&ev).await.unwrap(), "ORD-1: paid 149.99");

    let back = dispatch.await.unwrap();
    assert!(Event::ptr_eq(&ev, &back));
}

#[tokio::test]
async fn builder_installs_wildcards_before_first_dispatch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let wild = Arc::clone(&hits);
    let count: AnyHandlerRef = AnyHandlerFn::arc("count", move |_ev: Arc<dyn AnyEvent>| {
        let wild = Arc::clone(&wild);
        async move {
            wild.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    });
    let bus = Dispatcher::builder(DispatcherConfig::default())
        .with_wildcard_handlers(vec![count])
        .build_shared();

    bus.dispatch(user("1")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
