// Expose the modules
pub mod config;
pub mod domain;

// Re-export key types for easier usage
pub use config::{Config, ConfigError};
pub use domain::models::event::{DomainEvent, Event};
pub use domain::services::events::{
    Completion, EventDispatcher, EventError, EventHandler, EventLogger, EventResult,
    SharedHandler,
};
