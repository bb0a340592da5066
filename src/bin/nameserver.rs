use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tiny_nameserver::config::NameServerConfig;
use tiny_nameserver::utils::shutdown_signal;
use tiny_nameserver::{Metrics, NameServer, RpcServer, ServiceRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    let config = NameServerConfig::parse();
    let logger = match config.logging.init() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let registry = Arc::new(ServiceRegistry::new());
    let name_server = Arc::new(NameServer::with_metrics(registry, Metrics::instance()));

    let server = match RpcServer::bind(&config.listen, name_server.clone()).await {
        Ok(server) => server,
        Err(e) => {
            logger.critical(&format!("cannot listen on {}: {}", config.listen, e));
            return ExitCode::FAILURE;
        }
    };

    match server.local_addr() {
        Ok(addr) => logger.info(&format!("name server listening on {}", addr)),
        Err(_) => logger.info(&format!("name server listening on {}", config.listen)),
    }
    logger.info("methods: NameServer.Register, NameServer.Deregister, NameServer.Lookup");

    if let Err(e) = server.serve(shutdown_signal()).await {
        logger.critical(&format!("name server failed: {}", e));
        return ExitCode::FAILURE;
    }

    let counters = name_server.metrics().get_counters();
    let mut names: Vec<_> = counters.keys().collect();
    names.sort();
    for name in names {
        logger.info(&format!("{} = {}", name, counters[name]));
    }
    ExitCode::SUCCESS
}
