use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ServiceError;
use crate::messaging::protocol::CounterReply;

/// Key/value store with an atomic increment. Only the MySQL backend is shared
/// between workers; the in-memory one counts per worker process.
pub trait CounterStore: Send + Sync {
    /// Adds one to `key` and returns the new count.
    fn increment(&self, key: &str) -> Result<i64, ServiceError>;
}

/// Store local to one process; used for tests and single-worker setups.
#[derive(Default)]
pub struct InMemoryCounterStore {
    counts: Mutex<HashMap<String, i64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, key: &str) -> Result<i64, ServiceError> {
        let mut counts = self.counts.lock();
        let count = counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

pub struct CounterService {
    store: Arc<dyn CounterStore>,
}

impl CounterService {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        CounterService { store }
    }

    pub fn count(&self, key: &str) -> Result<CounterReply, ServiceError> {
        if key.is_empty() {
            return Err(ServiceError::EmptyKey);
        }
        let count = self.store.increment(key)?;
        Ok(CounterReply {
            count,
            message: format!("'{}' has been requested {} time(s)", key, count),
        })
    }
}
