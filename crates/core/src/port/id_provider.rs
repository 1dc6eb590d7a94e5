// ID Provider Port (for deterministic testing)

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::TaskId;

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique task ID
    fn generate_id(&self) -> TaskId;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> TaskId {
        TaskId::generate()
    }
}

/// Counter-based provider: `<prefix>-1`, `<prefix>-2`, ...
pub struct SequentialIdProvider {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> TaskId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        TaskId::new(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdProvider::new("task");
        assert_eq!(ids.generate_id().as_str(), "task-1");
        assert_eq!(ids.generate_id().as_str(), "task-2");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        assert_ne!(UuidProvider.generate_id(), UuidProvider.generate_id());
    }
}
