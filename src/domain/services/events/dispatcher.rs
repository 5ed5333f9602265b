//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods     |
// |-------------------------|---------------------------------------------------|-----------------|
// | EventDispatcher         | Routes events to registered handlers              | dispatch        |
//--------------------------------------------------------------------------------------------------

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::ptr;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{Instrument, debug, error, info_span, trace, warn};

use super::completion::{Completion, CompletionBarrier};
use super::event_types::{EventError, EventResult};
use super::handlers::EventHandler;
use crate::domain::models::event::Event;

/// A handler as stored in the registry.
pub type SharedHandler<E> = Arc<dyn EventHandler<E>>;

/// Dispatches events to the handlers registered under the event's name.
///
/// Registration and queries are synchronous and guarded by a reader-writer
/// lock. Dispatch fans the event out to one tokio task per handler and waits
/// for all of them. Clones share the same registry.
pub struct EventDispatcher<E: Event> {
    /// Map of event names to handlers, in registration order
    handlers: Arc<RwLock<HashMap<String, Vec<SharedHandler<E>>>>>,
}

impl<E: Event> Clone for EventDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<E: Event> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let counts: HashMap<&str, usize> = handlers
            .iter()
            .map(|(name, registered)| (name.as_str(), registered.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .finish()
    }
}

/// Data address of a handler; identity ignores the vtable.
fn handler_addr<E: Event>(handler: &dyn EventHandler<E>) -> *const () {
    ptr::from_ref(handler).cast()
}

fn position_of<E: Event>(
    registered: &[SharedHandler<E>],
    handler: &dyn EventHandler<E>,
) -> Option<usize> {
    let target = handler_addr(handler);
    registered.iter().position(|h| handler_addr(&**h) == target)
}

impl<E: Event> EventDispatcher<E> {
    /// Creates a dispatcher with an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a handler under an event name.
    ///
    /// # Arguments
    /// * `event_name` - Name of the events the handler reacts to
    /// * `handler` - The handler instance
    ///
    /// # Returns
    /// * `Ok(())` - The handler was appended to the list for `event_name`
    /// * `Err(EventError::DuplicateHandler)` - This instance is already registered
    ///   under `event_name`; the registry is unchanged
    /// * `Err(EventError::InvalidEventName)` - `event_name` is empty
    pub fn register(&self, event_name: &str, handler: SharedHandler<E>) -> EventResult<()> {
        if event_name.is_empty() {
            return Err(EventError::InvalidEventName);
        }

        let mut handlers = self.handlers.write();
        let registered = handlers.entry(event_name.to_string()).or_default();

        if position_of(registered, &*handler).is_some() {
            debug!(
                "Handler {} already registered for event: {}",
                handler.handler_name(),
                event_name
            );
            return Err(EventError::DuplicateHandler {
                event_name: event_name.to_string(),
            });
        }

        debug!(
            "Registered handler {} for event: {}",
            handler.handler_name(),
            event_name
        );
        registered.push(handler);
        Ok(())
    }

    /// Returns true if this handler instance is registered under `event_name`.
    pub fn has(&self, event_name: &str, handler: &dyn EventHandler<E>) -> bool {
        self.handlers
            .read()
            .get(event_name)
            .is_some_and(|registered| position_of(registered, handler).is_some())
    }

    /// Removes a handler from an event name, keeping the order of the others.
    ///
    /// Removing a handler that is not registered is a no-op and still
    /// returns `Ok(())`.
    pub fn unregister(&self, event_name: &str, handler: &dyn EventHandler<E>) -> EventResult<()> {
        let mut handlers = self.handlers.write();

        let emptied = match handlers.get_mut(event_name) {
            Some(registered) => match position_of(registered, handler) {
                Some(index) => {
                    registered.remove(index);
                    debug!(
                        "Unregistered handler {} from event: {}",
                        handler.handler_name(),
                        event_name
                    );
                    registered.is_empty()
                }
                None => false,
            },
            None => false,
        };

        if emptied {
            handlers.remove(event_name);
        }
        Ok(())
    }

    /// Discards every registration for every event name.
    pub fn unregister_all(&self) {
        let mut handlers = self.handlers.write();
        debug!("Unregistering handlers for {} events", handlers.len());
        handlers.clear();
    }

    /// Number of handlers registered under `event_name`.
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers.read().get(event_name).map_or(0, Vec::len)
    }

    /// Event names with at least one handler, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns true if no handler is registered at all.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Clones the handler list for `event_name` so no lock is held while handlers run.
    pub(super) fn snapshot(&self, event_name: &str) -> Vec<SharedHandler<E>> {
        self.handlers
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Dispatches an event to every handler registered under its name.
    ///
    /// Each handler runs as its own tokio task. The call returns once every
    /// handler has signalled its [`Completion`]. Handler errors and panics
    /// are logged and never change the result.
    ///
    /// A handler that neither finishes nor signals keeps this call waiting;
    /// use [`EventDispatcher::dispatch_timeout`] on latency-sensitive paths.
    ///
    /// # Panics
    /// Must be awaited inside a tokio runtime. Handlers are started with
    /// `tokio::spawn`, which panics under any other executor.
    ///
    /// # Returns
    /// * `Ok(())` - All handlers completed, or none were registered
    /// * `Err(EventError::InvalidEventName)` - The event name is empty
    pub async fn dispatch(&self, event: E) -> EventResult<()> {
        if event.name().is_empty() {
            return Err(EventError::InvalidEventName);
        }

        let handlers = self.snapshot(event.name());
        if handlers.is_empty() {
            debug!("No handlers registered for event: {}", event.name());
            return Ok(());
        }

        let event = Arc::new(event);
        let barrier = CompletionBarrier::new();
        debug!(
            "Dispatching event {} to {} handlers",
            event.name(),
            handlers.len()
        );

        for handler in handlers {
            let done = barrier.completion();
            let span = info_span!(
                "event_handler",
                event = event.name(),
                event_id = ?event.id(),
                handler = handler.handler_name()
            );
            tokio::spawn(run_handler(handler, Arc::clone(&event), done).instrument(span));
        }

        trace!("Waiting on {} handlers", barrier.pending());
        barrier.wait().await;
        trace!("All handlers completed for event: {}", event.name());
        Ok(())
    }

    /// Dispatches an event, giving up on waiting after `timeout`.
    ///
    /// Handlers still running when the deadline expires are not cancelled;
    /// they finish in the background. Like [`EventDispatcher::dispatch`], this
    /// needs a tokio runtime.
    ///
    /// # Returns
    /// * `Err(EventError::DispatchTimeout)` - The deadline expired first
    /// * Otherwise the result of [`EventDispatcher::dispatch`]
    pub async fn dispatch_timeout(&self, event: E, timeout: Duration) -> EventResult<()> {
        let event_name = event.name().to_string();
        match tokio::time::timeout(timeout, self.dispatch(event)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Dispatch of {} timed out after {:?}; abandoning outstanding handlers",
                    event_name, timeout
                );
                Err(EventError::DispatchTimeout {
                    event_name,
                    timeout,
                })
            }
        }
    }
}

/// Runs one handler, containing its failures.
async fn run_handler<E: Event>(handler: SharedHandler<E>, event: Arc<E>, done: Completion) {
    match AssertUnwindSafe(handler.handle(event, done)).catch_unwind().await {
        Ok(Ok(())) => trace!("Handler finished"),
        Ok(Err(e)) => error!("Handler failed to process event: {}", e),
        Err(panic) => error!("Handler panicked: {}", panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
