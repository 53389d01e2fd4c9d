//! SQLite database module

pub mod models;
pub mod filters;
mod migrations;
mod countries;
mod status;

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
pub use countries::canonical_name;
pub use filters::{CountryFilters, SortKey};
use models::*;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database wrapper over a connection pool
#[derive(Clone)]
pub struct SqliteDb {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteDb {
    /// Open (or create) the database file and run migrations
    pub fn new(path: &Path, max_connections: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            // WAL lets readers keep their snapshot while a refresh merges
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
            conn.execute_batch("PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;")?;
            conn.busy_timeout(BUSY_TIMEOUT)
        });

        let pool = Pool::builder().max_size(max_connections).build(manager)?;

        let db = Self { pool };

        // Run migrations
        db.run_migrations()?;

        tracing::info!("SQLite database ready at {:?}", path);
        Ok(db)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        migrations::run_migrations(&conn)
    }

    // ========== Country Methods ==========

    /// Atomically merge a refresh batch and record the refresh time
    pub fn merge_countries(
        &self,
        rows: &[CountryRecord],
        refreshed_at: DateTime<Utc>,
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        countries::merge_batch(&mut conn, rows, refreshed_at)
    }

    /// List countries with filters and ordering
    pub fn query_countries(&self, filters: &CountryFilters) -> Result<Vec<CountryRecord>> {
        let conn = self.conn()?;
        countries::query_countries(&conn, filters)
    }

    /// Get country by (case-insensitive) name
    pub fn get_country(&self, name: &str) -> Result<Option<CountryRecord>> {
        let conn = self.conn()?;
        countries::get_country_by_name(&conn, name)
    }

    /// Delete country by (case-insensitive) name
    pub fn delete_country(&self, name: &str) -> Result<()> {
        let conn = self.conn()?;
        countries::delete_country_by_name(&conn, name)
    }

    /// Total number of countries
    pub fn count_countries(&self) -> Result<i64> {
        let conn = self.conn()?;
        countries::count_countries(&conn)
    }

    // ========== Status Methods ==========

    /// Get aggregate stats
    pub fn get_stats(&self) -> Result<Stats> {
        let conn = self.conn()?;
        status::get_stats(&conn)
    }

    /// Totals, top-N and refresh time read from a single snapshot
    pub fn summary_snapshot(&self, limit: usize) -> Result<SummarySnapshot> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let stats = status::get_stats(&tx)?;
        let top_by_gdp = countries::top_by_gdp(&tx, limit)?;
        tx.commit()?;

        Ok(SummarySnapshot {
            total_countries: stats.total_countries,
            top_by_gdp,
            last_refreshed_at: stats.last_refreshed_at,
        })
    }
}

/// Run a blocking database call off the async runtime
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Database task failed: {}", e)))?
}
