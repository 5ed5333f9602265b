//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the in-process event dispatcher: named events are fanned out to every
// handler registered under that name, each handler running concurrently, and the dispatching
// caller resumes once all of them have signalled completion.
//
// | Component                | Description                                                |
// |--------------------------|------------------------------------------------------------|
// | EventError               | Registration and dispatch errors                           |
// | EventHandler             | Trait for components that react to events                  |
// | Completion               | At-most-once completion signal handed to each handler      |
// | EventDispatcher          | Registry of handlers per event name, plus fan-out/join      |
// | EventLogger              | Handler that logs events and keeps a bounded history       |
//--------------------------------------------------------------------------------------------------

mod completion;
mod dispatcher;
mod event_types;
mod handlers;


// Re-exports
pub use completion::Completion;
pub use dispatcher::{EventDispatcher, SharedHandler};
pub use event_types::{EventError, EventResult};
pub use handlers::{EventHandler, EventLogger};
