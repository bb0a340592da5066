use std::sync::Arc;
use std::time::Duration;

use crate::error::{ClientError, SelectionError};
use crate::messaging::protocol::CounterReply;
use crate::network::{NameServerClient, WorkerClient};
use crate::services::{LoadBalancer, Strategy, WorkerInfo};
use crate::utils::Logger;

/// Client view of the worker pool: the last lookup snapshot plus a balancer.
///
/// The snapshot only changes on `refresh`; workers that join or leave in
/// between are not seen until then.
pub struct WorkerPool {
    directory: NameServerClient,
    balancer: LoadBalancer,
    snapshot: Vec<WorkerInfo>,
    service_name: String,
    call_timeout: Duration,
    logger: Arc<Logger>,
}

impl WorkerPool {
    pub fn new(directory: NameServerClient, balancer: LoadBalancer, call_timeout: Duration) -> Self {
        WorkerPool {
            directory,
            balancer,
            snapshot: Vec::new(),
            service_name: String::new(),
            call_timeout,
            logger: Logger::instance(),
        }
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.balancer.strategy()
    }

    pub fn snapshot(&self) -> &[WorkerInfo] {
        &self.snapshot
    }

    /// Replaces the snapshot with a fresh lookup and returns its size. An
    /// empty pool is not an error here; `pick` reports it.
    pub async fn refresh(&mut self) -> Result<usize, ClientError> {
        self.snapshot = self.directory.lookup(&self.service_name).await?;
        self.logger.info(&format!(
            "lookup at {} found {} workers",
            self.directory.address(),
            self.snapshot.len()
        ));
        for (i, worker) in self.snapshot.iter().enumerate() {
            self.logger.debug(&format!(
                "  [{}] {} (weight {:.3})",
                i, worker.address, worker.weight
            ));
        }
        Ok(self.snapshot.len())
    }

    pub fn pick(&self) -> Result<&WorkerInfo, SelectionError> {
        let worker = self.balancer.select(&self.snapshot)?;
        self.logger.debug(&format!(
            "{} selection picked {}",
            self.balancer.strategy(),
            worker.address
        ));
        Ok(worker)
    }

    /// Runs `Fibonacci(n)` on a selected worker; returns the worker address
    /// together with the value.
    pub async fn fibonacci(&self, n: i64) -> Result<(String, i64), ClientError> {
        let address = self.pick()?.address.clone();
        let value = WorkerClient::new(address.as_str(), self.call_timeout)
            .fibonacci(n)
            .await?;
        Ok((address, value))
    }

    pub async fn counter(&self, key: &str) -> Result<(String, CounterReply), ClientError> {
        let address = self.pick()?.address.clone();
        let reply = WorkerClient::new(address.as_str(), self.call_timeout)
            .counter(key)
            .await?;
        Ok((address, reply))
    }
}
