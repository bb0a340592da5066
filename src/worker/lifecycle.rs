use std::io;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::TcpListener;
use tokio::time::timeout;

use crate::network::NameServerClient;
use crate::services::worker_info::normalize_weight;
use crate::utils::Logger;

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Weight a worker announces. An explicit value in (0, 1] is used as is;
/// otherwise a uniform draw, normalized so a zero draw becomes 1.0.
pub fn choose_weight(requested: Option<f64>) -> f64 {
    let logger = Logger::instance();
    match requested {
        Some(weight) if weight > 0.0 && weight <= 1.0 => weight,
        Some(weight) => {
            let drawn = draw_weight();
            logger.warning(&format!(
                "invalid weight {}, using random weight {:.3}",
                weight, drawn
            ));
            drawn
        }
        None => draw_weight(),
    }
}

fn draw_weight() -> f64 {
    normalize_weight(rand::thread_rng().gen::<f64>())
}

/// Binds the first free port in `port..port + tries`.
pub async fn bind_with_retry(host: &str, port: u16, tries: u16) -> io::Result<TcpListener> {
    let mut last_error =
        io::Error::new(io::ErrorKind::InvalidInput, "no port left to try");

    for offset in 0..tries {
        let candidate = match port.checked_add(offset) {
            Some(p) => p,
            None => break,
        };
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

/// Registers a worker with the name server at startup and removes it again
/// at shutdown. Both calls are best effort: failures are logged and the
/// worker carries on.
pub struct WorkerLifecycle {
    directory: NameServerClient,
    address: String,
    weight: f64,
    shutdown_timeout: Duration,
    logger: Arc<Logger>,
}

impl WorkerLifecycle {
    pub fn new(directory: NameServerClient, address: impl Into<String>, weight: f64) -> Self {
        WorkerLifecycle {
            directory,
            address: address.into(),
            weight,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            logger: Logger::instance(),
        }
    }

    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns whether the name server accepted the registration.
    pub async fn announce(&self) -> bool {
        match self.directory.register(&self.address, self.weight).await {
            Ok(reply) if reply.success => {
                self.logger
                    .info(&format!("registration completed: {}", reply.message));
                true
            }
            Ok(reply) => {
                self.logger
                    .error(&format!("registration refused: {}", reply.message));
                false
            }
            Err(e) => {
                self.logger.warning(&format!(
                    "cannot reach name server at {}: {}; serving direct requests only",
                    self.directory.address(),
                    e
                ));
                false
            }
        }
    }

    /// Deregisters, giving up after the shutdown timeout.
    pub async fn withdraw(&self) -> bool {
        self.logger.info(&format!(
            "deregistering {} from name server at {}",
            self.address,
            self.directory.address()
        ));

        match timeout(self.shutdown_timeout, self.directory.deregister(&self.address)).await {
            Ok(Ok(reply)) if reply.success => {
                self.logger
                    .info(&format!("deregistration completed: {}", reply.message));
                true
            }
            Ok(Ok(reply)) => {
                self.logger
                    .warning(&format!("deregistration refused: {}", reply.message));
                false
            }
            Ok(Err(e)) => {
                self.logger
                    .warning(&format!("deregistration failed, entry may be stale: {}", e));
                false
            }
            Err(_) => {
                self.logger.warning(&format!(
                    "deregistration timed out after {:?}, entry may be stale",
                    self.shutdown_timeout
                ));
                false
            }
        }
    }
}
