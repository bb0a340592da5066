pub mod client;
pub mod config;
pub mod error;
pub mod messaging;
pub mod network;
pub mod services;
pub mod storage;
pub mod utils;
pub mod worker;

pub use client::WorkerPool;
pub use error::{ClientError, RegistryError, RpcError, SelectionError, ServiceError};
pub use messaging::{Deserializer, Serializer};
pub use network::{NameServerClient, RpcHandler, RpcServer, WorkerClient};
pub use services::{LoadBalancer, NameServer, ServiceRegistry, Strategy, WorkerInfo};
pub use utils::{LogLevel, Logger, Metrics};
pub use worker::{WorkerLifecycle, WorkerService};
