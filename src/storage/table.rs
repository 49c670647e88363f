//! Row-insertion table target.
//!
//! Each record becomes one row; a batch is inserted in a single transaction.
//! The database file is created on first connect and runs in WAL mode.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::record::RecordBatch;
use crate::storage::StorageError;
use crate::storage::schema::record_table_ddl;

/// How long to wait for the single connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Table target backed by SQLite.
#[derive(Debug, Clone)]
pub struct TableSink {
    pool: SqlitePool,
    table: String,
}

impl TableSink {
    /// Connect to `url` and create `table` if missing.
    ///
    /// `url` is an sqlx SQLite URL such as `sqlite:data/recorder.db?mode=rwc`
    /// or `sqlite::memory:`.
    pub async fn connect(url: &str, table: impl Into<String>) -> Result<Self, StorageError> {
        let table = table.into();
        let ddl = record_table_ddl(&table)?;
        let pool = open_pool(url).await?;
        for statement in &ddl {
            sqlx::query(statement).execute(&pool).await?;
        }
        tracing::debug!(table = %table, "Table target ready");
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Insert every record of `batch`. Returns the number of rows written.
    pub async fn insert(&self, batch: &RecordBatch) -> Result<usize, StorageError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT INTO {} (recorded_at, symbol, payload) VALUES (?, ?, ?)",
            self.table
        );
        let recorded_at = batch.fetched_at.timestamp_millis();

        let mut tx = self.pool.begin().await?;
        for record in batch {
            let symbol = record.get("symbol").and_then(|v| v.as_str());
            let payload = serde_json::to_string(record)?;
            sqlx::query(&sql)
                .bind(recorded_at)
                .bind(symbol)
                .bind(payload)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(batch.len())
    }

    /// Number of rows currently in the table.
    pub async fn row_count(&self) -> Result<i64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let row: (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(row.0)
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// One connection: inserts are strictly sequential per target, and a single
/// connection keeps a `sqlite::memory:` database alive between statements.
async fn open_pool(url: &str) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;
    Ok(pool)
}
