// Submodules
mod listener;
pub mod routes;

// Public API
pub use listener::{Listener, ListenerStatus};
