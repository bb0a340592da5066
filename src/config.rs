//! Command-line and environment configuration for the three binaries.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::services::Strategy;
use crate::utils::{LogLevel, Logger};

pub const DEFAULT_NAMESERVER_ADDR: &str = "localhost:9000";
pub const DEFAULT_NAMESERVER_LISTEN: &str = "0.0.0.0:9000";
pub const DEFAULT_WORKER_PORT: u16 = 12345;
pub const DEFAULT_PORT_TRIES: u16 = 100;

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Also append log lines to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,
}

impl LoggingArgs {
    pub fn init(&self) -> std::io::Result<Arc<Logger>> {
        Logger::init(self.log_level, self.log_file.as_deref())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "nameserver", about = "Directory of available workers")]
pub struct NameServerConfig {
    /// Listen address in host:port format
    #[arg(long, env = "NAMESERVER_LISTEN", default_value = DEFAULT_NAMESERVER_LISTEN)]
    pub listen: String,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterBackend {
    Memory,
    Mysql,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "worker", about = "Serves Fibonacci and Counter, registered with the name server")]
pub struct WorkerConfig {
    /// Interface to bind
    #[arg(long, env = "WORKER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// First port to try
    #[arg(long, env = "WORKER_PORT", default_value_t = DEFAULT_WORKER_PORT)]
    pub port: u16,

    /// How many consecutive ports to try before giving up
    #[arg(long, default_value_t = DEFAULT_PORT_TRIES)]
    pub port_tries: u16,

    /// Host part of the address announced to the name server
    #[arg(long, env = "WORKER_ADVERTISE_HOST", default_value = "localhost")]
    pub advertise_host: String,

    /// Capacity in (0, 1]; random when omitted
    #[arg(long, env = "WORKER_WEIGHT")]
    pub weight: Option<f64>,

    #[arg(long, env = "NAMESERVER_ADDR", default_value = DEFAULT_NAMESERVER_ADDR)]
    pub nameserver: String,

    #[arg(long, value_enum, default_value = "memory")]
    pub store: CounterBackend,

    #[arg(long, env = "MYSQL_URL", default_value = "mysql://root@localhost:3306/counters")]
    pub mysql_url: String,

    #[arg(long, default_value_t = 5000)]
    pub call_timeout_ms: u64,

    /// Upper bound on the deregistration call at shutdown
    #[arg(long, default_value_t = 3000)]
    pub shutdown_timeout_ms: u64,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl WorkerConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "client", about = "Looks up workers and load-balances calls across them")]
pub struct ClientConfig {
    /// stateless (round-robin) or stateful (weighted random)
    #[arg(value_enum)]
    pub strategy: Strategy,

    #[arg(long, env = "NAMESERVER_ADDR", default_value = DEFAULT_NAMESERVER_ADDR)]
    pub nameserver: String,

    /// Passed to Lookup; the name server does not filter on it
    #[arg(long, default_value = "")]
    pub service: String,

    #[arg(long, default_value_t = 5000)]
    pub call_timeout_ms: u64,

    #[command(subcommand)]
    pub command: ClientCommand,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl ClientConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ClientCommand {
    /// Print the registered workers
    Lookup,
    /// Fibonacci of n on the selected worker(s)
    Fibonacci {
        #[arg(allow_negative_numbers = true)]
        n: i64,
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Bump the shared counter for a key
    Counter {
        key: String,
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
}
