use mysql::prelude::Queryable;
use mysql::{params, Opts, Pool, PooledConn, TxOpts};

use crate::error::ServiceError;
use crate::services::CounterStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS request_counters (
    counter_key VARCHAR(255) NOT NULL PRIMARY KEY,
    count BIGINT NOT NULL
)";

const UPSERT: &str = "INSERT INTO request_counters (counter_key, count) VALUES (:key, 1)
    ON DUPLICATE KEY UPDATE count = count + 1";

const SELECT_COUNT: &str = "SELECT count FROM request_counters WHERE counter_key = :key";

/// Counter store shared by every worker through one MySQL database.
///
/// The increment and the read of the new value happen in one transaction;
/// the upsert holds the row lock until commit.
pub struct MySqlCounterStore {
    pool: Pool,
}

impl MySqlCounterStore {
    pub fn connect(url: &str) -> Result<Self, ServiceError> {
        let opts = Opts::from_url(url).map_err(unavailable)?;
        let pool = Pool::new(opts).map_err(unavailable)?;
        let store = MySqlCounterStore { pool };
        store.get_connection()?.query_drop(CREATE_TABLE).map_err(unavailable)?;
        Ok(store)
    }

    fn get_connection(&self) -> Result<PooledConn, ServiceError> {
        self.pool.get_conn().map_err(unavailable)
    }
}

impl CounterStore for MySqlCounterStore {
    fn increment(&self, key: &str) -> Result<i64, ServiceError> {
        let mut conn = self.get_connection()?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .map_err(unavailable)?;

        tx.exec_drop(UPSERT, params! { "key" => key })
            .map_err(unavailable)?;
        let count: Option<i64> = tx
            .exec_first(SELECT_COUNT, params! { "key" => key })
            .map_err(unavailable)?;
        tx.commit().map_err(unavailable)?;

        count.ok_or_else(|| ServiceError::StoreUnavailable(format!("counter '{}' vanished", key)))
    }
}

fn unavailable<E: std::fmt::Display>(err: E) -> ServiceError {
    ServiceError::StoreUnavailable(err.to_string())
}
