//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines what the dispatcher routes: anything that carries a name, a creation
// timestamp and a typed payload slot.
//
// | Name            | Description                                          | Key Methods          |
// |-----------------|------------------------------------------------------|----------------------|
// | Event           | Capability every dispatchable event implements       | name, payload        |
// | DomainEvent<P>  | Ready-made serializable event with a typed payload   | new, with_payload    |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named unit of information that can be dispatched to handlers.
///
/// The name is the registry key and must not change once the event exists.
/// The payload type is bound to the event type, so handlers read it without
/// downcasting.
pub trait Event: Send + Sync + 'static {
    /// Payload carried by this event.
    type Payload: Send + Sync + 'static;

    /// Returns the event name used to look up handlers.
    fn name(&self) -> &str;

    /// Returns the instant the event was created.
    ///
    /// Informational only: the dispatcher never orders by it.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Returns the payload, if one has been set.
    fn payload(&self) -> Option<&Self::Payload>;

    /// Replaces the payload.
    fn set_payload(&mut self, payload: Self::Payload);

    /// Optional correlation id surfaced in handler log spans.
    fn id(&self) -> Option<Uuid> {
        None
    }
}

/// General purpose event with a typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<P> {
    /// Unique event id, for log correlation
    pub id: Uuid,
    /// Event name, e.g. `payment.created`
    name: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Payload slot
    pub payload: Option<P>,
}

impl<P> DomainEvent<P> {
    /// Creates an event with an empty payload slot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timestamp: Utc::now(),
            payload: None,
        }
    }

    /// Creates an event carrying `payload`.
    pub fn with_payload(name: impl Into<String>, payload: P) -> Self {
        let mut event = Self::new(name);
        event.payload = Some(payload);
        event
    }
}

impl<P> Event for DomainEvent<P>
where
    P: Send + Sync + 'static,
{
    type Payload = P;

    fn name(&self) -> &str {
        &self.name
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    fn set_payload(&mut self, payload: P) {
        self.payload = Some(payload);
    }

    fn id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_has_no_payload() {
        let event: DomainEvent<String> = DomainEvent::new("payment.created");
        assert_eq!(event.name(), "payment.created");
        assert!(event.payload().is_none());
        assert!(event.timestamp() <= Utc::now());
    }

    #[test]
    fn test_set_payload_replaces_previous_value() {
        let mut event = DomainEvent::with_payload("payment.created", 10u64);
        assert_eq!(event.payload(), Some(&10));

        event.set_payload(25);
        assert_eq!(event.payload(), Some(&25));
        assert_eq!(event.name(), "payment.created");
    }

    #[test]
    fn test_events_get_distinct_ids() {
        let first: DomainEvent<()> = DomainEvent::new("a");
        let second: DomainEvent<()> = DomainEvent::new("a");
        assert_ne!(first.id, second.id);
        assert_eq!(Event::id(&first), Some(first.id));
    }

    #[test]
    fn test_serializes_name_and_payload() {
        let event = DomainEvent::with_payload("payment.failed", "card declined".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "payment.failed");
        assert_eq!(json["payload"], "card declined");
    }
}
