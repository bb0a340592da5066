use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::ValueEnum;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::worker_info::WorkerInfo;
use crate::error::SelectionError;

/// Picks one worker out of a lookup snapshot.
pub trait Selector: Send + Sync {
    fn select<'a>(&self, workers: &'a [WorkerInfo]) -> Result<&'a WorkerInfo, SelectionError>;
}

/// Cycles through the snapshot by position; weights are ignored.
///
/// The cursor is applied modulo the current snapshot size, so a snapshot that
/// grows or shrinks between calls may skip or repeat an entry.
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        RoundRobin {
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector for RoundRobin {
    fn select<'a>(&self, workers: &'a [WorkerInfo]) -> Result<&'a WorkerInfo, SelectionError> {
        let len = workers.len();
        if len == 0 {
            return Err(SelectionError::NoWorkers);
        }

        let previous = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| {
                Some((i % len + 1) % len)
            })
            .unwrap_or_else(|i| i);
        Ok(&workers[previous % len])
    }
}

/// Draws a worker with probability proportional to its weight. Every call
/// draws fresh; there is no affinity between calls.
pub struct WeightedRandom {
    rng: Mutex<StdRng>,
}

impl WeightedRandom {
    pub fn new() -> Self {
        WeightedRandom {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of draws.
    pub fn with_seed(seed: u64) -> Self {
        WeightedRandom {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for WeightedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector for WeightedRandom {
    fn select<'a>(&self, workers: &'a [WorkerInfo]) -> Result<&'a WorkerInfo, SelectionError> {
        let (first, last) = match (workers.first(), workers.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SelectionError::NoWorkers),
        };

        let total: f64 = workers.iter().map(|w| w.weight).sum();
        if !total.is_finite() || total <= 0.0 {
            return Ok(first);
        }

        let r = self.rng.lock().gen::<f64>() * total;
        let mut cumulative = 0.0;
        for worker in workers {
            cumulative += worker.weight;
            if cumulative >= r {
                return Ok(worker);
            }
        }

        // rounding left the running sum just short of r
        Ok(last)
    }
}

/// Client-side balancing strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Round-robin over the snapshot.
    #[default]
    #[value(alias = "round-robin")]
    Stateless,
    /// Weighted random draw.
    #[value(alias = "weighted")]
    Stateful,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Stateless => f.write_str("stateless"),
            Strategy::Stateful => f.write_str("stateful"),
        }
    }
}

pub struct LoadBalancer {
    strategy: Strategy,
    selector: Box<dyn Selector>,
}

impl LoadBalancer {
    pub fn new(strategy: Strategy) -> Self {
        let selector: Box<dyn Selector> = match strategy {
            Strategy::Stateless => Box::new(RoundRobin::new()),
            Strategy::Stateful => Box::new(WeightedRandom::new()),
        };
        LoadBalancer { strategy, selector }
    }

    pub fn with_selector(strategy: Strategy, selector: Box<dyn Selector>) -> Self {
        LoadBalancer { strategy, selector }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn select<'a>(&self, workers: &'a [WorkerInfo]) -> Result<&'a WorkerInfo, SelectionError> {
        self.selector.select(workers)
    }
}
