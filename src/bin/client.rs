use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::Parser;
use tiny_nameserver::config::{ClientCommand, ClientConfig};
use tiny_nameserver::{LoadBalancer, NameServerClient, WorkerPool};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ClientConfig::parse();
    let logger = match config.logging.init() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let directory = NameServerClient::new(config.nameserver.as_str(), config.call_timeout());
    let mut pool = WorkerPool::new(
        directory,
        LoadBalancer::new(config.strategy),
        config.call_timeout(),
    )
    .with_service_name(config.service.as_str());

    if let Err(e) = pool.refresh().await {
        logger.critical(&format!("lookup failed: {}", e));
        return ExitCode::FAILURE;
    }

    // per-worker hit count, printed at the end
    let mut hits: BTreeMap<String, u32> = BTreeMap::new();

    match &config.command {
        ClientCommand::Lookup => {
            for worker in pool.snapshot() {
                println!(
                    "{}\tport={}\tweight={:.3}",
                    worker.address, worker.port, worker.weight
                );
            }
            return ExitCode::SUCCESS;
        }
        ClientCommand::Fibonacci { n, repeat } => {
            for _ in 0..*repeat {
                match pool.fibonacci(*n).await {
                    Ok((address, value)) => {
                        println!("[{}] Fibonacci({}) = {}", address, n, value);
                        *hits.entry(address).or_default() += 1;
                    }
                    Err(e) => {
                        logger.error(&format!("Fibonacci({}) failed: {}", n, e));
                        return ExitCode::FAILURE;
                    }
                }
            }
        }
        ClientCommand::Counter { key, repeat } => {
            for _ in 0..*repeat {
                match pool.counter(key).await {
                    Ok((address, reply)) => {
                        println!("[{}] {} -> {}", address, reply.message, reply.count);
                        *hits.entry(address).or_default() += 1;
                    }
                    Err(e) => {
                        logger.error(&format!("Counter('{}') failed: {}", key, e));
                        return ExitCode::FAILURE;
                    }
                }
            }
        }
    }

    if hits.len() > 1 {
        println!("distribution ({}):", pool.strategy());
        for (address, count) in &hits {
            println!("  {}: {}", address, count);
        }
    }
    ExitCode::SUCCESS
}
