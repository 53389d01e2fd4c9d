//! Refresh Service
//!
//! Full resync of the country table from the two upstream sources:
//! concurrent fetch, decode, per-country join with the rate table, GDP
//! estimate, one atomic merge, then a detached summary projection.

use crate::db::sqlite::canonical_name;
use crate::db::sqlite::models::CountryRecord;
use crate::db::sqlite::run_blocking;
use crate::error::{AppError, Result};
use crate::services::SummaryService;
use crate::sources::types::{CountryPayload, RatesPayload};
use crate::sources::{Source, Sources};
use crate::state::AppState;
use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Bounds of the synthetic per-capita productivity factor
const GDP_MULTIPLIER_MIN: f64 = 1000.0;
const GDP_MULTIPLIER_MAX: f64 = 2000.0;

/// Result of a committed refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub countries: usize,
    pub refreshed_at: DateTime<Utc>,
}

/// Decoded upstream data, both sources present and non-empty
#[derive(Debug)]
pub struct UpstreamData {
    pub countries: Vec<CountryPayload>,
    pub rates: HashMap<String, f64>,
}

pub struct RefreshService;

impl RefreshService {
    /// Run a full refresh.
    ///
    /// Returns once the merge has committed; the summary artifact is
    /// regenerated in the background afterwards.
    pub async fn refresh(state: &Arc<AppState>) -> Result<RefreshResult> {
        info!("RefreshService::refresh");

        let upstream = Self::fetch_upstream(&state.sources).await?;

        let refreshed_at = Utc::now().trunc_subsecs(6);
        let rows = {
            let mut rng = rand::thread_rng();
            build_rows(&upstream.countries, &upstream.rates, refreshed_at, &mut rng)
        };

        if rows.is_empty() {
            let source = state.sources.countries.id();
            error!("{} source returned no usable entries", source);
            return Err(AppError::Upstream(vec![format!("{} (empty)", source)]));
        }

        let sqlite = state.sqlite.clone();
        let count = run_blocking(move || sqlite.merge_countries(&rows, refreshed_at))
            .await
            .map_err(|e| {
                error!("Failed to merge refreshed countries: {}", e);
                e
            })?;

        info!("Refreshed {} countries at {}", count, refreshed_at);

        SummaryService::spawn_projection(state.clone());

        Ok(RefreshResult {
            countries: count,
            refreshed_at,
        })
    }

    /// Fetch both sources concurrently and decode them.
    ///
    /// Every failing source is collected before giving up so the error lists
    /// all of them.
    pub async fn fetch_upstream(sources: &Sources) -> Result<UpstreamData> {
        let (countries_body, rates_body) =
            tokio::join!(sources.countries.fetch(), sources.rates.fetch());

        let mut failed = Vec::new();

        let countries: Option<Vec<CountryPayload>> =
            decode(&*sources.countries, countries_body, &mut failed);
        let rates: Option<RatesPayload> = decode(&*sources.rates, rates_body, &mut failed);

        let countries = countries.filter(|c| {
            let ok = !c.is_empty();
            if !ok {
                error!("{} source returned an empty list", sources.countries.id());
                failed.push(format!("{} (empty)", sources.countries.id()));
            }
            ok
        });

        let rates = rates.and_then(|r| r.rates).filter(|r| !r.is_empty());
        if rates.is_none() && !failed.iter().any(|f| f.starts_with(sources.rates.id())) {
            error!("{} source returned no rate mapping", sources.rates.id());
            failed.push(format!("{} (empty)", sources.rates.id()));
        }

        match (countries, rates) {
            (Some(countries), Some(rates)) if failed.is_empty() => {
                debug!(
                    "Fetched {} countries and {} rates",
                    countries.len(),
                    rates.len()
                );
                Ok(UpstreamData { countries, rates })
            }
            _ => Err(AppError::Upstream(failed)),
        }
    }
}

fn decode<T: DeserializeOwned>(
    source: &dyn Source,
    body: Result<Vec<u8>>,
    failed: &mut Vec<String>,
) -> Option<T> {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to fetch {}: {}", source.id(), e);
            failed.push(source.id().to_string());
            return None;
        }
    };

    match serde_json::from_slice(&body) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Failed to decode {} payload: {}", source.id(), e);
            failed.push(format!("{} (invalid payload)", source.id()));
            None
        }
    }
}

/// Join countries with the rate table into rows ready to merge.
///
/// Entries without a name or with a population that does not fit the store
/// are skipped. Only the first listed currency is looked up. A country
/// listing no currency at all gets an estimated GDP of 0; a currency without
/// a usable rate leaves rate and GDP null.
pub fn build_rows<R: Rng>(
    countries: &[CountryPayload],
    rates: &HashMap<String, f64>,
    refreshed_at: DateTime<Utc>,
    rng: &mut R,
) -> Vec<CountryRecord> {
    countries
        .iter()
        .filter_map(|country| {
            let name = canonical_name(&country.name);
            if name.is_empty() {
                warn!("Skipping country entry without a name");
                return None;
            }

            let Ok(population) = i64::try_from(country.population) else {
                warn!("Skipping {}: population {} out of range", name, country.population);
                return None;
            };

            let mut record = CountryRecord {
                id: None,
                name,
                capital: fold_optional(country.capital.as_deref()),
                region: fold_optional(country.region.as_deref()),
                population,
                currency_code: None,
                exchange_rate: None,
                estimated_gdp: None,
                flag_url: country
                    .flag_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string),
                last_refreshed_at: refreshed_at,
            };

            if country.has_no_currencies() {
                record.estimated_gdp = Some(0.0);
            } else if let Some(code) = country.primary_currency() {
                record.currency_code = Some(code.to_string());

                match rates.get(code) {
                    Some(&rate) if rate.is_finite() && rate > 0.0 => {
                        record.exchange_rate = Some(rate);
                        record.estimated_gdp = Some(estimate_gdp(country.population, rate, rng));
                    }
                    Some(&rate) => {
                        warn!("Ignoring unusable rate {} for currency {}", rate, code);
                    }
                    None => {
                        debug!("No rate for currency {} ({})", code, record.name);
                    }
                }
            }

            Some(record)
        })
        .collect()
}

/// population * U[1000, 2000) / rate
fn estimate_gdp<R: Rng>(population: u64, rate: f64, rng: &mut R) -> f64 {
    let multiplier = rng.gen_range(GDP_MULTIPLIER_MIN..GDP_MULTIPLIER_MAX);
    population as f64 * multiplier / rate
}

fn fold_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}
