//! Refresh status and aggregate stats

use super::countries::parse_timestamp;
use super::models::Stats;
use crate::error::Result;
use rusqlite::Connection;

/// Row count plus last refresh time, read in one statement so both come
/// from the same snapshot. A missing status row yields a null time.
pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let (total_countries, has_status, raw): (i64, bool, Option<String>) = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM countries),
                EXISTS(SELECT 1 FROM app_status WHERE id = 1),
                (SELECT last_refreshed_at FROM app_status WHERE id = 1)",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    if !has_status {
        tracing::warn!("No refresh status row found, reporting stats without timestamp");
    }

    let last_refreshed_at = raw.map(|ts| parse_timestamp(2, &ts)).transpose()?;

    Ok(Stats {
        total_countries,
        last_refreshed_at,
    })
}
