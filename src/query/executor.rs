//! Runs a guarded query on a pooled connection and maps the result rows.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use duckdb::types::ValueRef;
use duckdb::Connection;
use serde_json::Value;
use tracing::debug;

use crate::db::db_pool::DbPool;
use crate::query::{QueryOutput, ResultRow};

#[derive(Debug)]
pub enum ExecuteError {
    /// No connection could be acquired from the pool.
    Connection(String),
    /// The database rejected the query (syntax, unknown column, ...). The
    /// query is model output, so this is attributed to bad generation.
    Rejected(String),
    /// The blocking task itself failed.
    Task(String),
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Connection(msg) => write!(f, "database connection error: {}", msg),
            ExecuteError::Rejected(msg) => write!(f, "query rejected by database: {}", msg),
            ExecuteError::Task(msg) => write!(f, "database task error: {}", msg),
        }
    }
}

impl Error for ExecuteError {}

/// Executes the query on a connection from the pool. DuckDB work is
/// blocking, so it runs on the blocking thread pool; the pooled connection
/// is dropped (returned) on every exit path.
pub async fn execute(pool: &DbPool, sql: String) -> Result<QueryOutput, ExecuteError> {
    let pool = pool.clone();

    let task = tokio::task::spawn_blocking(move || -> Result<QueryOutput, ExecuteError> {
        let conn = pool
            .get()
            .map_err(|e| ExecuteError::Connection(e.to_string()))?;
        run_query(&conn, &sql).map_err(|e| ExecuteError::Rejected(e.to_string()))
    });

    match task.await {
        Ok(result) => result,
        Err(join_err) => Err(ExecuteError::Task(join_err.to_string())),
    }
}

/// Prepares and runs `sql`, zipping the statement's reported column names
/// against each fetched row.
pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryOutput, duckdb::Error> {
    let start_time = Instant::now();

    let mut stmt = conn.prepare(sql)?;

    let mut columns = Vec::with_capacity(stmt.column_count());
    for i in 0..stmt.column_count() {
        columns.push(stmt.column_name(i)?.to_string());
    }

    let mut mapped_rows: Vec<ResultRow> = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut mapped = ResultRow::new();
        for (i, name) in columns.iter().enumerate() {
            mapped.insert(name.clone(), cell_to_json(row.get_ref(i)?));
        }
        mapped_rows.push(mapped);
    }

    let row_count = mapped_rows.len();
    let execution_time_ms = start_time.elapsed().as_millis() as u64;
    debug!("Fetched {} row(s) in {}ms", row_count, execution_time_ms);

    Ok(QueryOutput {
        columns,
        rows: mapped_rows,
        row_count,
        execution_time_ms,
    })
}

/// Converts one dynamically-typed cell into a JSON value. Column types are
/// not statically known at this layer, so every cell goes through the
/// driver's tagged reference.
fn cell_to_json(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::from(b),
        ValueRef::TinyInt(v) => Value::from(v as i64),
        ValueRef::SmallInt(v) => Value::from(v as i64),
        ValueRef::Int(v) => Value::from(v as i64),
        ValueRef::BigInt(v) => Value::from(v),
        ValueRef::HugeInt(v) => i64::try_from(v)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(v.to_string())),
        ValueRef::UTinyInt(v) => Value::from(v as u64),
        ValueRef::USmallInt(v) => Value::from(v as u64),
        ValueRef::UInt(v) => Value::from(v as u64),
        ValueRef::UBigInt(v) => Value::from(v),
        ValueRef::Float(v) => Value::from(v as f64),
        ValueRef::Double(v) => Value::from(v),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(d.to_string())),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<{} bytes>", b.len())),
        other => Value::String(format!("{:?}", other)),
    }
}
