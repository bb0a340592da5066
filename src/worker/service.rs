use std::sync::Arc;

use crate::error::ServiceError;
use crate::messaging::protocol::{FibonacciReply, Request, Response};
use crate::network::RpcHandler;
use crate::services::arithmetic::fibonacci;
use crate::services::{CounterService, CounterStore};
use crate::utils::Logger;

/// The methods a worker serves: `Fibonacci` and `Counter`.
pub struct WorkerService {
    counter: CounterService,
    logger: Arc<Logger>,
}

impl WorkerService {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        WorkerService {
            counter: CounterService::new(store),
            logger: Logger::instance(),
        }
    }

    fn dispatch(&self, request: Request) -> Result<Response, ServiceError> {
        match request {
            Request::Fibonacci(args) => {
                let value = fibonacci(args.n)?;
                self.logger
                    .debug(&format!("Fibonacci({}) = {}", args.n, value));
                Ok(Response::Fibonacci(FibonacciReply { value }))
            }
            Request::Counter(args) => {
                let reply = self.counter.count(&args.key)?;
                self.logger.debug(&reply.message);
                Ok(Response::Counter(reply))
            }
            other => Err(ServiceError::Unsupported(other.method())),
        }
    }
}

impl RpcHandler for WorkerService {
    fn handle(&self, request: Request) -> Response {
        let method = request.method();
        self.dispatch(request).unwrap_or_else(|e| {
            self.logger.warning(&format!("{} failed: {}", method, e));
            Response::Fault(e.to_string())
        })
    }
}
