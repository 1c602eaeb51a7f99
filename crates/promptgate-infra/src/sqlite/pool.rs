//! SQLite pool with split reader/writer connections.
//!
//! SQLite allows only one writer at a time. Quota checks and usage
//! reports are read-heavy and must not queue behind ledger INSERTs, so
//! the pool pairs a single-connection writer with a read-only reader
//! pool sized for concurrent window queries.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool over one SQLite database file.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database at `db_path` and bring
    /// the schema up to date.
    ///
    /// Migrations run on the writer before the read-only reader pool
    /// connects. WAL journal mode lets readers proceed while a ledger
    /// INSERT is in flight; the busy timeout absorbs writer contention.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }
}
