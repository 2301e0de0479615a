//! # Example: Basic
//!
//! Registers handlers for two event types, dispatches them, waits for a specific event
//! from a background task and awaits an event's result while its dispatch is running.
//!
//! Run with:
//! ```text
//! RUST_LOG=info cargo run --example basic --features logging
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use busify::{
    AnyHandlerRef, Dispatcher, DispatcherConfig, Event, HandlerError, HandlerFn, HandlerRef,
    LogWriter, Payload,
};

const WELCOME_EMAIL_DELAY: Duration = Duration::from_millis(500);
const PROFILE_CREATION_DELAY: Duration = Duration::from_millis(300);
const PAYMENT_PROCESSING_DELAY: Duration = Duration::from_millis(400);
const DELAYED_EVENT_DELAY: Duration = Duration::from_secs(1);
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct UserRegistered {
    username: String,
    email: String,
}

impl Payload for UserRegistered {
    type Output = String;
}

#[derive(Debug)]
struct OrderPlaced {
    order_id: String,
    amount: f64,
}

#[derive(Debug, Clone)]
struct PaymentReceipt {
    order_id: String,
    status: &'static str,
    amount: f64,
}

impl fmt::Display for PaymentReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order {} {} ({:.2})", self.order_id, self.status, self.amount)
    }
}

impl Payload for OrderPlaced {
    type Output = PaymentReceipt;
}

fn send_welcome_email() -> HandlerRef<UserRegistered> {
    HandlerFn::arc("send_welcome_email", |ev: Event<UserRegistered>| async move {
        println!("[email] sending welcome email to {}", ev.email);
        tokio::time::sleep(WELCOME_EMAIL_DELAY).await;
        println!("[email] welcome email sent to {}", ev.username);
        ev.set_result(format!("Email sent to {}", ev.email))?;
        Ok::<(), HandlerError>(())
    })
}

fn create_user_profile() -> HandlerRef<UserRegistered> {
    HandlerFn::arc("create_user_profile", |ev: Event<UserRegistered>| async move {
        println!("[profile] creating profile for {}", ev.username);
        tokio::time::sleep(PROFILE_CREATION_DELAY).await;
        println!("[profile] profile created for {}", ev.username);
        Ok::<(), HandlerError>(())
    })
}

fn process_payment() -> HandlerRef<OrderPlaced> {
    HandlerFn::arc("process_payment", |ev: Event<OrderPlaced>| async move {
        println!(
            "[payment] processing ${:.2} for order {}",
            ev.amount, ev.order_id
        );
        tokio::time::sleep(PAYMENT_PROCESSING_DELAY).await;
        println!("[payment] order {} paid", ev.order_id);
        ev.set_result(PaymentReceipt {
            order_id: ev.order_id.clone(),
            status: "paid",
            amount: ev.amount,
        })?;
        Ok::<(), HandlerError>(())
    })
}

fn section(title: &str) {
    println!("\n== {title}");
    println!("{}", "-".repeat(60));
}

async fn user_registration(bus: &Dispatcher) -> anyhow::Result<()> {
    section("Example 1: User Registration");
    let ev = bus
        .dispatch(Event::new(UserRegistered {
            username: "alice".into(),
            email: "alice@example.com".into(),
        }))
        .await;
    println!("result: {:?}", ev.result()?);
    Ok(())
}

async fn order_placement(bus: &Dispatcher) -> anyhow::Result<()> {
    section("Example 2: Order Placement");
    let ev = bus
        .dispatch(Event::new(OrderPlaced {
            order_id: "ORD-12345".into(),
            amount: 99.99,
        }))
        .await;
    match ev.result()? {
        Some(receipt) => println!("receipt: {receipt}"),
        None => println!("no receipt"),
    }
    Ok(())
}

async fn wait_for_event(bus: &Arc<Dispatcher>) -> anyhow::Result<()> {
    section("Example 3: Wait for Event");

    let background = Arc::clone(bus);
    tokio::spawn(async move {
        tokio::time::sleep(DELAYED_EVENT_DELAY).await;
        println!("[background] dispatching UserRegistered for bob");
        background
            .dispatch(Event::new(UserRegistered {
                username: "bob".into(),
                email: "bob@example.com".into(),
            }))
            .await;
    });

    println!("waiting for UserRegistered(bob)...");
    let ev = bus
        .wait_for_event_where(Some(EVENT_TIMEOUT), |ev: &Event<UserRegistered>| {
            ev.username == "bob"
        })
        .await?;
    println!("received event for user: {}", ev.username);
    Ok(())
}

async fn awaitable_event(bus: &Arc<Dispatcher>) -> anyhow::Result<()> {
    section("Example 4: Awaiting Event Result");

    let ev = Event::new(OrderPlaced {
        order_id: "ORD-67890".into(),
        amount: 149.99,
    });
    let dispatch = {
        let bus = Arc::clone(bus);
        let ev = ev.clone();
        tokio::spawn(async move { bus.dispatch(ev).await })
    };

    let receipt = ev.wait_timeout(EVENT_TIMEOUT).await?;
    println!("receipt: {receipt}");
    dispatch.await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let log: AnyHandlerRef = Arc::new(LogWriter::new());
    let bus = Dispatcher::builder(DispatcherConfig::default())
        .with_wildcard_handlers(vec![log])
        .build_shared();

    bus.subscribe::<UserRegistered, _>(send_welcome_email());
    bus.subscribe::<UserRegistered, _>(create_user_profile());
    bus.subscribe::<OrderPlaced, _>(process_payment());

    user_registration(&bus).await?;
    order_placement(&bus).await?;
    wait_for_event(&bus).await?;
    awaitable_event(&bus).await?;

    println!("\nall examples completed");
    Ok(())
}
