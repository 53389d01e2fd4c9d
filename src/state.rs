//! Application state management

use crate::config::AppConfig;
use crate::db::sqlite::SqliteDb;
use crate::error::Result;
use crate::sources::{HttpSource, Sources};
use crate::summary::SummaryStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across all handlers and services
pub struct AppState {
    /// SQLite connection pool
    pub sqlite: SqliteDb,

    /// Upstream country and rate sources
    pub sources: Sources,

    /// Summary artifact slot
    pub summary: SummaryStore,
}

impl AppState {
    /// Create application state from validated configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        tracing::info!("Data directory: {:?}", config.data_dir);

        let sqlite = SqliteDb::new(&config.database_path, config.database_max_connections)?;

        let countries = HttpSource::new("countries", config.countries_url.clone(), config.fetch_timeout)?;
        let rates = HttpSource::new("rates", config.rates_url.clone(), config.fetch_timeout)?;
        let sources = Sources::new(Arc::new(countries), Arc::new(rates));

        Ok(Self::from_parts(sqlite, sources, config.data_dir.clone()))
    }

    /// Assemble state from already built parts; the artifact cache lives
    /// under `<data_dir>/cache`
    pub fn from_parts(sqlite: SqliteDb, sources: Sources, data_dir: PathBuf) -> Self {
        Self {
            sqlite,
            sources,
            summary: SummaryStore::new(data_dir.join("cache")),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::AppError;
    use crate::sources::Source;
    use async_trait::async_trait;
    use std::path::Path;

    /// Source answering with a fixed body, or a 503 when `body` is `None`
    pub struct StaticSource {
        pub id: &'static str,
        pub body: Option<&'static str>,
    }

    #[async_trait]
    impl Source for StaticSource {
        fn id(&self) -> &str {
            self.id
        }

        async fn fetch(&self) -> Result<Vec<u8>> {
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(AppError::UpstreamStatus {
                    source_id: self.id.to_string(),
                    status: 503,
                }),
            }
        }
    }

    pub fn static_sources(countries: Option<&'static str>, rates: Option<&'static str>) -> Sources {
        Sources::new(
            Arc::new(StaticSource {
                id: "countries",
                body: countries,
            }),
            Arc::new(StaticSource {
                id: "rates",
                body: rates,
            }),
        )
    }

    /// State backed by a database file under `dir`
    pub fn state_in(dir: &Path, sources: Sources) -> Arc<AppState> {
        let sqlite = SqliteDb::new(&dir.join("countries.db"), 4).unwrap();
        Arc::new(AppState::from_parts(sqlite, sources, dir.to_path_buf()))
    }
}
