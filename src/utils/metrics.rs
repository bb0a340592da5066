use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

/// Running sum and sample count.
#[derive(Default)]
struct Histogram {
    sum: f64,
    count: usize,
}

/// In-process counters, gauges and histograms keyed by name.
///
/// `Metrics::instance()` gives the process-wide set; components that need
/// isolation (tests, several name servers in one process) take their own
/// `Arc<Metrics>`.
pub struct Metrics {
    counters: RwLock<HashMap<String, Arc<AtomicI64>>>,
    gauges: RwLock<HashMap<String, Arc<AtomicUsize>>>,
    histograms: RwLock<HashMap<String, Arc<Mutex<Histogram>>>>,
}

impl Metrics {
    pub fn instance() -> Arc<Metrics> {
        static INSTANCE: OnceLock<Arc<Metrics>> = OnceLock::new();
        INSTANCE.get_or_init(|| Arc::new(Metrics::new())).clone()
    }

    pub fn new() -> Self {
        Metrics {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
        }
    }

    pub fn increment_counter(&self, name: &str) {
        get_or_insert(&self.counters, name).fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_gauge(&self, name: &str, value: usize) {
        get_or_insert(&self.gauges, name).store(value, Ordering::Relaxed);
    }

    pub fn update_histogram(&self, name: &str, value: f64) {
        let histogram = get_or_insert(&self.histograms, name);
        let mut histogram = histogram.lock();
        histogram.sum += value;
        histogram.count += 1;
    }

    pub fn counter(&self, name: &str) -> i64 {
        self.counters
            .read()
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn gauge(&self, name: &str) -> Option<usize> {
        self.gauges
            .read()
            .get(name)
            .map(|g| g.load(Ordering::Relaxed))
    }

    pub fn get_counters(&self) -> HashMap<String, i64> {
        self.counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn get_gauges(&self) -> HashMap<String, usize> {
        self.gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// `(sum, count)` per histogram.
    pub fn get_histograms(&self) -> HashMap<String, (f64, usize)> {
        self.histograms
            .read()
            .iter()
            .map(|(k, v)| {
                let h = v.lock();
                (k.clone(), (h.sum, h.count))
            })
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn get_or_insert<T: Default>(map: &RwLock<HashMap<String, Arc<T>>>, name: &str) -> Arc<T> {
    if let Some(existing) = map.read().get(name) {
        return Arc::clone(existing);
    }
    Arc::clone(map.write().entry(name.to_string()).or_default())
}
