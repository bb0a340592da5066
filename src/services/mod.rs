pub mod arithmetic;
pub mod counter;
pub mod load_balancer;
pub mod name_server;
pub mod service_registry;
pub mod worker_info;

pub use counter::{CounterService, CounterStore, InMemoryCounterStore};
pub use load_balancer::{LoadBalancer, RoundRobin, Selector, Strategy, WeightedRandom};
pub use name_server::NameServer;
pub use service_registry::{Registration, ServiceRegistry};
pub use worker_info::WorkerInfo;
