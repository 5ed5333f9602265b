//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods     |
// |-------------------------|---------------------------------------------------|-----------------|
// | EventHandler            | Trait for event handling                          | handle          |
// | EventLogger             | Logging handler with a bounded event history      | get_history     |
//--------------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::completion::Completion;
use super::event_types::EventResult;
use crate::domain::models::event::Event;

/// Upper bound on the history buffer allocated up front; it grows past this on demand
const INITIAL_HISTORY_CAPACITY: usize = 1024;

/// Event handler trait for reacting to dispatched events.
///
/// Handlers are compared by instance: registering two separate values with
/// identical state registers two handlers.
#[async_trait::async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    /// Reacts to an event.
    ///
    /// # Arguments
    /// * `event` - The event being dispatched, shared with every other handler
    /// * `done` - Signal the dispatcher waits on; call `done.done()` once finished
    ///
    /// # Returns
    /// An error is logged by the dispatcher and otherwise ignored.
    async fn handle(&self, event: Arc<E>, done: Completion) -> EventResult<()>;

    /// Name used in log output.
    fn handler_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A simple in-memory event logger for debugging
pub struct EventLogger<E> {
    /// Maximum number of events to keep in history
    max_history: usize,
    /// Event history, oldest first
    history: RwLock<VecDeque<Arc<E>>>,
}

impl<E: Event> EventLogger<E> {
    /// Creates a new event logger
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            history: RwLock::new(VecDeque::with_capacity(
                max_history.min(INITIAL_HISTORY_CAPACITY),
            )),
        }
    }

    /// Returns the event history
    pub async fn get_history(&self) -> Vec<Arc<E>> {
        self.history.read().await.iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl<E: Event> EventHandler<E> for EventLogger<E> {
    async fn handle(&self, event: Arc<E>, done: Completion) -> EventResult<()> {
        info!(
            event = event.name(),
            timestamp = %event.timestamp(),
            "Event received"
        );

        if self.max_history > 0 {
            let mut history = self.history.write().await;

            // Remove oldest event if at capacity
            if history.len() >= self.max_history {
                history.pop_front();
            }
            history.push_back(event);
        }

        done.done();
        Ok(())
    }

    fn handler_name(&self) -> &'static str {
        "EventLogger"
    }
}
