use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tiny_nameserver::config::{CounterBackend, WorkerConfig};
use tiny_nameserver::services::{CounterStore, InMemoryCounterStore};
use tiny_nameserver::storage::MySqlCounterStore;
use tiny_nameserver::utils::shutdown_signal;
use tiny_nameserver::worker::{bind_with_retry, choose_weight};
use tiny_nameserver::{NameServerClient, RpcServer, WorkerLifecycle, WorkerService};

#[tokio::main]
async fn main() -> ExitCode {
    let config = WorkerConfig::parse();
    let logger = match config.logging.init() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let weight = choose_weight(config.weight);

    let store: Arc<dyn CounterStore> = match config.store {
        CounterBackend::Memory => Arc::new(InMemoryCounterStore::new()),
        CounterBackend::Mysql => {
            let url = config.mysql_url.clone();
            match tokio::task::spawn_blocking(move || MySqlCounterStore::connect(&url)).await {
                Ok(Ok(store)) => {
                    logger.info("connected to MySQL counter store");
                    Arc::new(store)
                }
                Ok(Err(e)) => {
                    logger.critical(&format!("cannot open counter store: {}", e));
                    return ExitCode::FAILURE;
                }
                Err(e) => {
                    logger.critical(&format!("counter store setup aborted: {}", e));
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let listener = match bind_with_retry(&config.host, config.port, config.port_tries).await {
        Ok(listener) => listener,
        Err(e) => {
            logger.critical(&format!(
                "no free port in {}..+{}: {}",
                config.port, config.port_tries, e
            ));
            return ExitCode::FAILURE;
        }
    };
    let bound = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            logger.critical(&format!("cannot read bound address: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let address = format!("{}:{}", config.advertise_host, bound.port());
    logger.info(&format!(
        "worker listening on {}, advertised as {} with weight {:.3}",
        bound, address, weight
    ));
    logger.info("methods: Arithmetic.Fibonacci, Counter.Counter");

    let directory = NameServerClient::new(config.nameserver.as_str(), config.call_timeout());
    let lifecycle = WorkerLifecycle::new(directory, address, weight)
        .with_shutdown_timeout(config.shutdown_timeout());
    lifecycle.announce().await;

    let server = RpcServer::from_listener(listener, Arc::new(WorkerService::new(store)));
    let shutdown = async {
        shutdown_signal().await;
        lifecycle.withdraw().await;
    };

    if let Err(e) = server.serve(shutdown).await {
        logger.critical(&format!("worker failed: {}", e));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
