use std::collections::HashMap;

use parking_lot::RwLock;

use super::worker_info::{normalize_weight, WorkerInfo};
use crate::error::RegistryError;

/// What a `put` did to the registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Registration {
    Created { weight: f64 },
    Updated { previous: f64, weight: f64 },
    Unchanged { weight: f64 },
}

impl Registration {
    /// Weight stored after the call.
    pub fn weight(&self) -> f64 {
        match *self {
            Registration::Created { weight }
            | Registration::Updated { weight, .. }
            | Registration::Unchanged { weight } => weight,
        }
    }
}

/// Authoritative set of live workers, keyed by address.
///
/// Writers take the lock exclusively and readers share it, so a snapshot
/// always reflects a state that really existed.
pub struct ServiceRegistry {
    workers: RwLock<HashMap<String, WorkerInfo>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry {
            workers: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or refreshes `address`. Also returns the number of workers
    /// registered right after the change, read under the same write lock.
    pub fn put(&self, address: &str, weight: f64) -> (Registration, usize) {
        let weight = normalize_weight(weight);
        let mut workers = self.workers.write();

        let outcome = match workers.get_mut(address) {
            Some(existing) if existing.weight != weight => {
                let previous = existing.weight;
                existing.weight = weight;
                Registration::Updated { previous, weight }
            }
            Some(existing) => Registration::Unchanged {
                weight: existing.weight,
            },
            None => {
                workers.insert(address.to_string(), WorkerInfo::new(address, weight));
                Registration::Created { weight }
            }
        };
        (outcome, workers.len())
    }

    /// Removes `address`, returning the entry and the number of workers left.
    pub fn remove(&self, address: &str) -> Result<(WorkerInfo, usize), RegistryError> {
        let mut workers = self.workers.write();
        let removed = workers
            .remove(address)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;
        Ok((removed, workers.len()))
    }

    pub fn snapshot(&self) -> Vec<WorkerInfo> {
        self.workers.read().values().cloned().collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.workers.read().contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.workers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.read().is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
