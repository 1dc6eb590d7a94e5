// Application Layer - Admission engine and queue factory

pub mod admission;
pub mod batcher;

// Re-exports
pub use admission::{AdmissionQueue, AdmissionQueueBuilder, Submission};
pub use batcher::Batcher;
