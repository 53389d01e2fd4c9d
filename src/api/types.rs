//! REST API types
//!
//! Unset optional fields serialize as JSON `null`, never as zero or an empty
//! string.

use crate::db::sqlite::models::{CountryRecord, Stats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters of `GET /countries`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryResponse {
    pub id: Option<i64>,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl From<CountryRecord> for CountryResponse {
    fn from(record: CountryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            capital: record.capital,
            region: record.region,
            population: record.population,
            currency_code: record.currency_code,
            exchange_rate: record.exchange_rate,
            estimated_gdp: record.estimated_gdp,
            flag_url: record.flag_url,
            last_refreshed_at: record.last_refreshed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsResponse {
    pub total_countries: i64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            total_countries: stats.total_countries,
            last_refreshed_at: stats.last_refreshed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
