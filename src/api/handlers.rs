//! REST API endpoint handlers

use crate::api::types::*;
use crate::db::sqlite::CountryFilters;
use crate::error::{AppError, Result};
use crate::services::{CountryService, RefreshService, SummaryService};
use crate::state::AppState;
use crate::summary::CONTENT_TYPE;
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health or GET /
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Country exchange API is running".to_string(),
    })
}

// ============================================================================
// Countries
// ============================================================================

/// POST /countries/refresh
pub async fn refresh_countries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>> {
    let result = RefreshService::refresh(&state).await?;

    Ok(Json(MessageResponse::new(format!(
        "Refreshed {} countries",
        result.countries
    ))))
}

/// GET /countries?region=&currency=&sort=
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CountryResponse>>> {
    let filters = CountryFilters::new(
        query.region.as_deref(),
        query.currency.as_deref(),
        query.sort.as_deref(),
    );

    let countries = CountryService::list(&state, filters).await?;
    Ok(Json(countries.into_iter().map(CountryResponse::from).collect()))
}

/// GET /countries/{name}
pub async fn get_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CountryResponse>> {
    let country = CountryService::get(&state, &name).await?;
    Ok(Json(country.into()))
}

/// DELETE /countries/{name}
pub async fn delete_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    CountryService::delete(&state, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /countries/image
pub async fn get_summary_image(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    match SummaryService::load(&state).await? {
        Some(bytes) => Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], bytes)),
        None => {
            info!("Summary image requested before first refresh");
            Err(AppError::NotFound("Summary image".to_string()))
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// GET /status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>> {
    let stats = CountryService::stats(&state).await?;
    Ok(Json(stats.into()))
}
