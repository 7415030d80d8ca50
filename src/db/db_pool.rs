use duckdb::Connection;
use r2d2::{ManageConnection, Pool};

use crate::config::DatabaseConfig;

pub type DbPool = Pool<DuckDBConnectionManager>;

pub struct DuckDBConnectionManager {
    connection_string: String,
}

impl DuckDBConnectionManager {
    pub fn new(connection_string: String) -> Self {
        Self { connection_string }
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        if self.connection_string == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.connection_string)
        }
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Builds the shared connection pool for the tariff database.
pub fn build_pool(config: &DatabaseConfig) -> Result<DbPool, r2d2::Error> {
    let manager = DuckDBConnectionManager::new(config.connection_string.clone());
    Pool::builder()
        .max_size(config.pool_size as u32)
        .build(manager)
}
