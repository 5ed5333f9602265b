//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Demo entry point for the event dispatcher. Registers a console handler, an audit handler and
// an event logger for payment events, then dispatches a batch of them.
//--------------------------------------------------------------------------------------------------
// cargo run --bin dispatch_demo -- --payments 5
// cargo run --bin dispatch_demo -- --payments 10 --fail-every 3 --timeout-ms 500
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use event_dispatcher::{
    Completion, Config, DomainEvent, Event, EventDispatcher, EventHandler, EventLogger,
    EventResult,
};

const PAYMENT_CREATED: &str = "payment.created";
const PAYMENT_FAILED: &str = "payment.failed";

/// Payload kinds carried by payment events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PaymentPayload {
    Created {
        payment_id: Uuid,
        amount_cents: u64,
        currency: String,
    },
    Failed {
        payment_id: Uuid,
        reason: String,
    },
}

type PaymentEvent = DomainEvent<PaymentPayload>;

/// Console handler that displays payment events in the terminal
struct PaymentConsoleHandler;

#[async_trait]
impl EventHandler<PaymentEvent> for PaymentConsoleHandler {
    async fn handle(&self, event: Arc<PaymentEvent>, done: Completion) -> EventResult<()> {
        let payload = serde_json::to_string(&event.payload)
            .unwrap_or_else(|e| format!("<unserializable payload: {e}>"));
        info!("💳 {} [{}]: {}", event.name(), event.timestamp(), payload);
        done.done();
        Ok(())
    }
}

/// Counts every event it sees, per event name
#[derive(Default)]
struct AuditHandler {
    seen: Mutex<HashMap<String, usize>>,
}

impl AuditHandler {
    fn totals(&self) -> HashMap<String, usize> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl EventHandler<PaymentEvent> for AuditHandler {
    async fn handle(&self, event: Arc<PaymentEvent>, done: Completion) -> EventResult<()> {
        // Simulate a write to an audit store
        tokio::time::sleep(Duration::from_millis(10)).await;
        *self.seen.lock().entry(event.name().to_string()).or_default() += 1;
        done.done();
        Ok(())
    }
}

/// CLI options for the demo
#[derive(Parser, Debug)]
#[command(name = "dispatch_demo", about = "Dispatches sample payment events")]
struct Opt {
    /// Number of payments to emit
    #[arg(long, default_value_t = 5)]
    payments: usize,

    /// Emit a failure for every n-th payment (0 disables failures)
    #[arg(long, default_value_t = 3)]
    fail_every: usize,

    /// Dispatch deadline in milliseconds, overriding DISPATCH_TIMEOUT_MS
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn payment_events(index: usize, fail_every: usize) -> Vec<PaymentEvent> {
    let payment_id = Uuid::new_v4();
    let mut events = vec![DomainEvent::with_payload(
        PAYMENT_CREATED,
        PaymentPayload::Created {
            payment_id,
            amount_cents: 1_000 + 250 * index as u64,
            currency: "USD".to_string(),
        },
    )];

    if fail_every > 0 && (index + 1) % fail_every == 0 {
        events.push(DomainEvent::with_payload(
            PAYMENT_FAILED,
            PaymentPayload::Failed {
                payment_id,
                reason: "card declined".to_string(),
            },
        ));
    }
    events
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    let config = Config::try_from_env().context("failed to load configuration")?;

    // Initialize logging; RUST_LOG wins over LOG_LEVEL when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting {} ({}) event dispatcher demo",
        config.app_name, config.environment
    );

    let dispatcher = EventDispatcher::<PaymentEvent>::new();
    let console = Arc::new(PaymentConsoleHandler);
    let audit = Arc::new(AuditHandler::default());
    let logger = Arc::new(EventLogger::<PaymentEvent>::new(config.event_history));

    dispatcher.register(PAYMENT_CREATED, console)?;
    for name in [PAYMENT_CREATED, PAYMENT_FAILED] {
        dispatcher.register(name, audit.clone())?;
        dispatcher.register(name, logger.clone())?;
    }
    info!("Registered handlers for events: {:?}", dispatcher.event_names());

    let timeout = opt
        .timeout_ms
        .map(Duration::from_millis)
        .or(config.dispatch_timeout);

    for index in 0..opt.payments {
        for event in payment_events(index, opt.fail_every) {
            match timeout {
                Some(timeout) => dispatcher.dispatch_timeout(event, timeout).await?,
                None => dispatcher.dispatch(event).await?,
            }
        }
    }

    for (name, count) in audit.totals() {
        info!("Audited {} {} events", count, name);
    }
    info!(
        "Event logger holds {} of the most recent events",
        logger.get_history().await.len()
    );

    dispatcher.unregister_all();
    Ok(())
}
