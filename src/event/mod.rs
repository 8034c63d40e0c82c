// Event-driven architecture components
//
// This module provides the infrastructure for observing scan sessions as
// they progress, without coupling the state machine to its consumers.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::SessionEvent;

// Internal modules
mod bus;
mod events;
