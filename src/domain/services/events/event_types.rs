//--------------------------------------------------------------------------------------------------
// ENUMS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods     |
// |-------------------------|---------------------------------------------------|-----------------|
// | EventError              | Error types for registration and dispatch         | error, from     |
//--------------------------------------------------------------------------------------------------

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the event system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The same handler instance is already registered under this event name
    #[error("handler already registered for event: {event_name}")]
    DuplicateHandler {
        /// Event name the registration was attempted for
        event_name: String,
    },

    /// Event names are registry keys and may not be empty
    #[error("event name must not be empty")]
    InvalidEventName,

    /// A caller-side deadline expired before every handler completed
    #[error("dispatch of {event_name} did not complete within {timeout:?}")]
    DispatchTimeout {
        event_name: String,
        timeout: Duration,
    },

    /// Failed to process an event. Handlers return this; the dispatcher
    /// logs it and never propagates it.
    #[error("failed to process event: {0}")]
    ProcessingError(String),
}

/// Type alias for Result with EventError
pub type EventResult<T> = Result<T, EventError>;
