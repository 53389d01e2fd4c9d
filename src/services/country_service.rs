//! Country Service
//!
//! Read and delete operations on the stored country table.

use crate::db::sqlite::models::{CountryRecord, Stats};
use crate::db::sqlite::{run_blocking, CountryFilters};
use crate::error::{AppError, Result};
use crate::state::AppState;
use std::sync::Arc;
use tracing::{debug, info};

pub struct CountryService;

impl CountryService {
    /// List countries matching the filters, in the requested order
    pub async fn list(state: &Arc<AppState>, filters: CountryFilters) -> Result<Vec<CountryRecord>> {
        debug!(
            "CountryService::list region={:?} currency={:?} sort={}",
            filters.region, filters.currency, filters.sort
        );

        let sqlite = state.sqlite.clone();
        run_blocking(move || sqlite.query_countries(&filters)).await
    }

    /// Get a single country, case-insensitive on the name
    pub async fn get(state: &Arc<AppState>, name: &str) -> Result<CountryRecord> {
        let sqlite = state.sqlite.clone();
        let lookup = name.to_string();

        match run_blocking(move || sqlite.get_country(&lookup)).await? {
            Some(country) => Ok(country),
            None => {
                info!("Country not found: {}", name);
                Err(AppError::NotFound("Country".to_string()))
            }
        }
    }

    /// Delete a single country, case-insensitive on the name
    pub async fn delete(state: &Arc<AppState>, name: &str) -> Result<()> {
        let sqlite = state.sqlite.clone();
        let lookup = name.to_string();

        run_blocking(move || sqlite.delete_country(&lookup))
            .await
            .map_err(|e| {
                if matches!(e, AppError::NotFound(_)) {
                    info!("Delete of unknown country: {}", name);
                }
                e
            })?;

        info!("Deleted country: {}", name);
        Ok(())
    }

    /// Total stored countries and last refresh time
    pub async fn stats(state: &Arc<AppState>) -> Result<Stats> {
        let sqlite = state.sqlite.clone();
        run_blocking(move || sqlite.get_stats()).await
    }
}
