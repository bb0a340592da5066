pub mod logger;
pub mod metrics;
pub mod signal;

pub use self::logger::{LogLevel, Logger};
pub use self::metrics::Metrics;
pub use self::signal::shutdown_signal;
