use std::sync::Arc;

use super::service_registry::{Registration, ServiceRegistry};
use crate::error::{RegistryError, ServiceError};
use crate::messaging::protocol::{
    DeregisterArgs, LookupArgs, LookupReply, RegisterArgs, Request, Response, StatusReply,
};
use crate::network::RpcHandler;
use crate::utils::{Logger, Metrics};

pub const METRIC_REGISTER_CREATED: &str = "nameserver.register.created";
pub const METRIC_REGISTER_UPDATED: &str = "nameserver.register.updated";
pub const METRIC_REGISTER_UNCHANGED: &str = "nameserver.register.unchanged";
pub const METRIC_REGISTER_REJECTED: &str = "nameserver.register.rejected";
pub const METRIC_DEREGISTER_OK: &str = "nameserver.deregister.ok";
pub const METRIC_DEREGISTER_FAILED: &str = "nameserver.deregister.failed";
pub const METRIC_LOOKUP: &str = "nameserver.lookup";
pub const METRIC_LOOKUP_SIZE: &str = "nameserver.lookup.size";
pub const METRIC_WORKERS: &str = "nameserver.workers";

/// Remote-facing side of the registry: validates requests and turns every
/// outcome, including bad input, into a `{success, message}` reply.
pub struct NameServer {
    registry: Arc<ServiceRegistry>,
    metrics: Arc<Metrics>,
    logger: Arc<Logger>,
}

impl NameServer {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self::with_metrics(registry, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(registry: Arc<ServiceRegistry>, metrics: Arc<Metrics>) -> Self {
        NameServer {
            registry,
            metrics,
            logger: Logger::instance(),
        }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn register(&self, args: &RegisterArgs) -> StatusReply {
        let address = args.address.trim();
        if address.is_empty() {
            self.metrics.increment_counter(METRIC_REGISTER_REJECTED);
            self.logger.warning("Register rejected: empty address");
            return StatusReply::failure(RegistryError::EmptyAddress.to_string());
        }

        let (outcome, total) = self.registry.put(address, args.weight);
        let message = match outcome {
            Registration::Created { weight } => {
                self.metrics.increment_counter(METRIC_REGISTER_CREATED);
                format!("worker {} registered with weight {:.3}", address, weight)
            }
            Registration::Updated { previous, weight } => {
                self.metrics.increment_counter(METRIC_REGISTER_UPDATED);
                format!(
                    "worker {} already registered, weight updated from {:.3} to {:.3}",
                    address, previous, weight
                )
            }
            Registration::Unchanged { weight } => {
                self.metrics.increment_counter(METRIC_REGISTER_UNCHANGED);
                format!(
                    "worker {} already registered with weight {:.3}",
                    address, weight
                )
            }
        };

        self.metrics.set_gauge(METRIC_WORKERS, total);
        self.logger.info(&format!("{} ({} registered)", message, total));
        StatusReply::success(message)
    }

    pub fn deregister(&self, args: &DeregisterArgs) -> StatusReply {
        let address = args.address.trim();
        let result = if address.is_empty() {
            Err(RegistryError::EmptyAddress)
        } else {
            self.registry.remove(address)
        };

        match result {
            Ok((removed, total)) => {
                self.metrics.increment_counter(METRIC_DEREGISTER_OK);
                self.metrics.set_gauge(METRIC_WORKERS, total);
                self.logger.info(&format!(
                    "worker {} deregistered ({} registered)",
                    removed.address, total
                ));
                StatusReply::success(format!("worker {} deregistered", removed.address))
            }
            Err(e) => {
                self.metrics.increment_counter(METRIC_DEREGISTER_FAILED);
                self.logger.warning(&format!("Deregister rejected: {}", e));
                StatusReply::failure(e.to_string())
            }
        }
    }

    /// Every registered worker. The service name is not used to filter.
    pub fn lookup(&self, args: &LookupArgs) -> LookupReply {
        let servers = self.registry.snapshot();
        self.metrics.increment_counter(METRIC_LOOKUP);
        self.metrics
            .update_histogram(METRIC_LOOKUP_SIZE, servers.len() as f64);
        self.logger.debug(&format!(
            "lookup for '{}' returned {} workers",
            args.service_name,
            servers.len()
        ));
        LookupReply { servers }
    }
}

impl RpcHandler for NameServer {
    fn handle(&self, request: Request) -> Response {
        match request {
            Request::Register(args) => Response::Register(self.register(&args)),
            Request::Deregister(args) => Response::Deregister(self.deregister(&args)),
            Request::Lookup(args) => Response::Lookup(self.lookup(&args)),
            other => Response::Fault(ServiceError::Unsupported(other.method()).to_string()),
        }
    }
}
