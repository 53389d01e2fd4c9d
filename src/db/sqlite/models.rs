//! SQLite database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Country row, keyed by its case-folded name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
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

/// Row count plus last refresh time, computed on read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_countries: i64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Input handed to the summary projector
#[derive(Debug, Clone)]
pub struct SummarySnapshot {
    pub total_countries: i64,
    pub top_by_gdp: Vec<CountryRecord>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}
