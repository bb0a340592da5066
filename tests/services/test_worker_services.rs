use std::sync::Arc;
use std::thread;

use tiny_nameserver::messaging::protocol::{
    CounterArgs, FibonacciArgs, LookupArgs, Request, Response,
};
use tiny_nameserver::services::arithmetic::fibonacci;
use tiny_nameserver::services::{CounterService, CounterStore, InMemoryCounterStore};
use tiny_nameserver::{RpcHandler, ServiceError, WorkerService};

struct BrokenStore;

impl CounterStore for BrokenStore {
    fn increment(&self, _key: &str) -> Result<i64, ServiceError> {
        Err(ServiceError::StoreUnavailable("connection refused".to_string()))
    }
}

#[test]
fn test_fibonacci() {
    assert_eq!(fibonacci(10), Ok(55));
    assert_eq!(fibonacci(0), Ok(0));
    assert!(fibonacci(-3).is_err());
}

#[test]
fn test_counter_counts_per_key() {
    let service = CounterService::new(Arc::new(InMemoryCounterStore::new()));

    assert_eq!(service.count("alice").unwrap().count, 1);
    assert_eq!(service.count("alice").unwrap().count, 2);
    assert_eq!(service.count("bob").unwrap().count, 1);

    let reply = service.count("alice").unwrap();
    assert_eq!(reply.count, 3);
    assert!(reply.message.contains("alice"));
}

#[test]
fn test_counter_rejects_empty_key() {
    let service = CounterService::new(Arc::new(InMemoryCounterStore::new()));
    assert_eq!(service.count(""), Err(ServiceError::EmptyKey));
}

#[test]
fn test_counter_store_unavailable() {
    let service = CounterService::new(Arc::new(BrokenStore));
    assert!(matches!(
        service.count("alice"),
        Err(ServiceError::StoreUnavailable(_))
    ));
}

#[test]
fn test_counter_increments_are_atomic() {
    let store = Arc::new(InMemoryCounterStore::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..100 {
                    store.increment("shared").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.increment("shared").unwrap(), 801);
}

#[test]
fn test_worker_service_dispatch() {
    let service = WorkerService::new(Arc::new(InMemoryCounterStore::new()));

    match service.handle(Request::Fibonacci(FibonacciArgs { n: 20 })) {
        Response::Fibonacci(reply) => assert_eq!(reply.value, 6765),
        other => panic!("unexpected {:?}", other),
    }

    match service.handle(Request::Counter(CounterArgs {
        key: "word".to_string(),
    })) {
        Response::Counter(reply) => assert_eq!(reply.count, 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_worker_service_faults() {
    let service = WorkerService::new(Arc::new(InMemoryCounterStore::new()));

    match service.handle(Request::Fibonacci(FibonacciArgs { n: -1 })) {
        Response::Fault(message) => assert!(message.contains("negative")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        service.handle(Request::Counter(CounterArgs { key: String::new() })),
        Response::Fault(_)
    ));
    assert!(matches!(
        service.handle(Request::Lookup(LookupArgs::default())),
        Response::Fault(_)
    ));
}
