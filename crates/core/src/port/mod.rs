// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing

// Re-exports
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
