//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Integration tests for the event dispatcher public API, driven through payment events.
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_test::assert_ok;

use event_dispatcher::{
    Completion, DomainEvent, Event, EventDispatcher, EventHandler, EventResult,
};

#[derive(Debug, Clone, PartialEq)]
struct Payment {
    id: u32,
    amount_cents: u64,
}

type PaymentEvent = DomainEvent<Payment>;

/// Records the event names it was invoked with
#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    fn count(&self, event_name: &str) -> usize {
        self.seen.lock().iter().filter(|name| *name == event_name).count()
    }
}

#[async_trait]
impl EventHandler<PaymentEvent> for RecordingHandler {
    async fn handle(&self, event: Arc<PaymentEvent>, done: Completion) -> EventResult<()> {
        self.seen.lock().push(event.name().to_string());
        done.done();
        Ok(())
    }
}

/// Sums the amounts of the payments it receives
#[derive(Default)]
struct LedgerHandler {
    totals: Mutex<HashMap<u32, u64>>,
}

#[async_trait]
impl EventHandler<PaymentEvent> for LedgerHandler {
    async fn handle(&self, event: Arc<PaymentEvent>, done: Completion) -> EventResult<()> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Some(payment) = event.payload() {
            *self.totals.lock().entry(payment.id).or_default() += payment.amount_cents;
        }
        done.done();
        Ok(())
    }
}

fn payment_event(name: &str, id: u32, amount_cents: u64) -> PaymentEvent {
    DomainEvent::with_payload(name, Payment { id, amount_cents })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_payment_created_reaches_only_its_handlers() {
    let dispatcher = EventDispatcher::<PaymentEvent>::new();
    let handler_a = Arc::new(RecordingHandler::default());
    let handler_b = Arc::new(RecordingHandler::default());

    assert_ok!(dispatcher.register("payment.created", handler_a.clone()));
    assert_ok!(dispatcher.register("payment.created", handler_b.clone()));
    assert_ok!(dispatcher.register("payment.failed", handler_b.clone()));

    assert_ok!(
        dispatcher
            .dispatch(payment_event("payment.created", 1, 1_000))
            .await
    );

    assert_eq!(handler_a.seen(), vec!["payment.created"]);
    assert_eq!(handler_b.seen(), vec!["payment.created"]);
    assert_eq!(handler_b.count("payment.failed"), 0);

    assert_ok!(
        dispatcher
            .dispatch(payment_event("payment.failed", 1, 1_000))
            .await
    );

    assert_eq!(handler_a.count("payment.failed"), 0);
    assert_eq!(handler_b.count("payment.failed"), 1);
    assert_eq!(handler_b.count("payment.created"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_handlers_see_typed_payload() {
    let dispatcher = EventDispatcher::<PaymentEvent>::new();
    let ledger = Arc::new(LedgerHandler::default());
    assert_ok!(dispatcher.register("payment.created", ledger.clone()));

    for (id, amount) in [(1, 500), (2, 700), (1, 250)] {
        assert_ok!(
            dispatcher
                .dispatch(payment_event("payment.created", id, amount))
                .await
        );
    }

    let totals = ledger.totals.lock().clone();
    assert_eq!(totals.get(&1), Some(&750));
    assert_eq!(totals.get(&2), Some(&700));
}

#[tokio::test]
async fn test_dispatch_from_concurrent_tasks() {
    let dispatcher = EventDispatcher::<PaymentEvent>::new();
    let recorder = Arc::new(RecordingHandler::default());
    assert_ok!(dispatcher.register("payment.created", recorder.clone()));

    let tasks: Vec<_> = (0..10)
        .map(|id| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(payment_event("payment.created", id, 100))
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert_ok!(task.await.unwrap());
    }
    assert_eq!(recorder.count("payment.created"), 10);
}

#[tokio::test]
async fn test_teardown_then_dispatch_is_noop() {
    let dispatcher = EventDispatcher::<PaymentEvent>::new();
    let recorder = Arc::new(RecordingHandler::default());
    assert_ok!(dispatcher.register("payment.created", recorder.clone()));
    assert_ok!(dispatcher.register("payment.failed", recorder.clone()));

    dispatcher.unregister_all();
    assert!(dispatcher.event_names().is_empty());

    assert_ok!(
        dispatcher
            .dispatch(payment_event("payment.created", 1, 100))
            .await
    );
    assert!(recorder.seen().is_empty());
}
