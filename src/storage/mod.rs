mod mysql_store;

pub use mysql_store::MySqlCounterStore;
