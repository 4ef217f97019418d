//! Action dispatch table
//!
//! Handlers are registered once per action type at start-up; the registry is
//! then shared read-only and resolves each envelope's `@type` to its handler.

pub mod error;
pub mod handler;
pub mod registry;

// Re-export commonly used types
pub use error::{RegistryError, RegistryResult};
pub use handler::{ActionCapability, ActionHandler};
pub use registry::ActionRegistry;
