pub mod lifecycle;
pub mod service;

pub use lifecycle::{bind_with_retry, choose_weight, WorkerLifecycle};
pub use service::WorkerService;
