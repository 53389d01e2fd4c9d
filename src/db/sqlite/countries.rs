//! Country table: bulk merge, filtered reads, lookup and delete

use super::filters::CountryFilters;
use super::models::CountryRecord;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

/// Rows per multi-row INSERT into the staging table
const STAGING_CHUNK_SIZE: usize = 500;

const STAGING_COLUMNS: usize = 9;

const SELECT_COLUMNS: &str = "SELECT id, name, capital, region, population, currency_code,
            exchange_rate, estimated_gdp, flag_url, last_refreshed_at
     FROM countries";

const CREATE_STAGING_TABLE: &str = r#"
DROP TABLE IF EXISTS temp.staging_countries;
CREATE TEMP TABLE staging_countries (
    name TEXT NOT NULL PRIMARY KEY,
    capital TEXT,
    region TEXT,
    population INTEGER NOT NULL,
    currency_code TEXT,
    exchange_rate REAL,
    estimated_gdp REAL,
    flag_url TEXT,
    last_refreshed_at TEXT NOT NULL
);
"#;

const UPSERT_FROM_STAGING: &str = r#"
INSERT INTO countries (
    name, capital, region, population,
    currency_code, exchange_rate, estimated_gdp,
    flag_url, last_refreshed_at
)
SELECT name, capital, region, population,
       currency_code, exchange_rate, estimated_gdp,
       flag_url, last_refreshed_at
FROM temp.staging_countries WHERE true
ON CONFLICT(name) DO UPDATE SET
    capital = excluded.capital,
    region = excluded.region,
    population = excluded.population,
    currency_code = excluded.currency_code,
    exchange_rate = excluded.exchange_rate,
    estimated_gdp = excluded.estimated_gdp,
    flag_url = excluded.flag_url,
    last_refreshed_at = excluded.last_refreshed_at
"#;

/// Merge a refresh batch into the canonical table.
///
/// Staging, upsert and the status update share one transaction: any failure
/// rolls all of it back when `tx` is dropped uncommitted. Every row is
/// stamped with `refreshed_at`. Within a batch, a later row with the same
/// name replaces an earlier one.
pub fn merge_batch(
    conn: &mut Connection,
    rows: &[CountryRecord],
    refreshed_at: DateTime<Utc>,
) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute_batch(CREATE_STAGING_TABLE)?;

    for chunk in rows.chunks(STAGING_CHUNK_SIZE) {
        let placeholders = vec!["(?, ?, ?, ?, ?, ?, ?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO temp.staging_countries (
                name, capital, region, population,
                currency_code, exchange_rate, estimated_gdp,
                flag_url, last_refreshed_at
            ) VALUES {}",
            placeholders
        );

        let mut values: Vec<Value> = Vec::with_capacity(chunk.len() * STAGING_COLUMNS);
        for row in chunk {
            values.push(Value::Text(row.name.clone()));
            values.push(opt_text(&row.capital));
            values.push(opt_text(&row.region));
            values.push(Value::Integer(row.population));
            values.push(opt_text(&row.currency_code));
            values.push(opt_real(row.exchange_rate));
            values.push(opt_real(row.estimated_gdp));
            values.push(opt_text(&row.flag_url));
            values.push(Value::Text(format_timestamp(refreshed_at)));
        }

        tx.execute(&sql, params_from_iter(values))?;
    }

    let merged = tx.execute(UPSERT_FROM_STAGING, [])?;

    tx.execute(
        "INSERT INTO app_status (id, last_refreshed_at) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET last_refreshed_at = excluded.last_refreshed_at",
        params![format_timestamp(refreshed_at)],
    )?;

    tx.execute_batch("DROP TABLE IF EXISTS temp.staging_countries;")?;
    tx.commit()?;

    tracing::info!("Merged {} countries into database", merged);
    Ok(merged)
}

/// List countries matching `filters`, in the requested order
pub fn query_countries(conn: &Connection, filters: &CountryFilters) -> Result<Vec<CountryRecord>> {
    let (where_clause, values) = filters.where_clause();
    let sql = format!("{} {} {}", SELECT_COLUMNS, where_clause, filters.sort.order_by());

    let mut stmt = conn.prepare(&sql)?;
    let countries = stmt
        .query_map(params_from_iter(values), map_country)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(countries)
}

/// Look up one country by canonical name
pub fn get_country_by_name(conn: &Connection, name: &str) -> Result<Option<CountryRecord>> {
    let sql = format!("{} WHERE name = ?1", SELECT_COLUMNS);

    let country = conn
        .query_row(&sql, params![canonical_name(name)], map_country)
        .optional()?;

    Ok(country)
}

/// Delete one country by canonical name
pub fn delete_country_by_name(conn: &Connection, name: &str) -> Result<()> {
    let rows = conn.execute(
        "DELETE FROM countries WHERE name = ?1",
        params![canonical_name(name)],
    )?;

    if rows == 0 {
        return Err(AppError::NotFound("Country".to_string()));
    }

    Ok(())
}

/// Total number of stored countries
pub fn count_countries(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?;
    Ok(count)
}

/// The `limit` countries with the highest estimated GDP, null GDP last
pub fn top_by_gdp(conn: &Connection, limit: usize) -> Result<Vec<CountryRecord>> {
    let sql = format!(
        "{} ORDER BY estimated_gdp IS NULL ASC, estimated_gdp DESC, name ASC LIMIT ?1",
        SELECT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let countries = stmt
        .query_map(params![limit as i64], map_country)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(countries)
}

/// Canonical (case-folded) form of a country name
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn map_country(row: &Row<'_>) -> rusqlite::Result<CountryRecord> {
    let refreshed: String = row.get(9)?;

    Ok(CountryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        capital: row.get(2)?,
        region: row.get(3)?,
        population: row.get(4)?,
        currency_code: row.get(5)?,
        exchange_rate: row.get(6)?,
        estimated_gdp: row.get(7)?,
        flag_url: row.get(8)?,
        last_refreshed_at: parse_timestamp(9, &refreshed)?,
    })
}

fn opt_text(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn opt_real(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}
