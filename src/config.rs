//! Service configuration
//!
//! Every option can be given as a command line flag or through the
//! environment variable named next to it.

use crate::error::{AppError, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "country-exchange",
    version,
    about = "Country metadata and exchange rate aggregation service"
)]
pub struct Cli {
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Directory holding the database and the summary artifact cache.
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// SQLite database file (defaults to `<data_dir>/countries.db`).
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "8")]
    pub database_max_connections: u32,

    #[arg(long, env = "COUNTRIES_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    #[arg(long, env = "RATES_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Timeout applied to each upstream request.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// Comma-delimited list of allowed CORS origins, `*` allows any.
    #[arg(
        long,
        env = "CORS_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub cors_allowed_origins: Vec<String>,
}

/// CORS policy derived from the configured origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub database_max_connections: u32,
    pub countries_url: Url,
    pub rates_url: Url,
    pub fetch_timeout: Duration,
    pub cors_origins: CorsOrigins,
}

impl TryFrom<Cli> for AppConfig {
    type Error = AppError;

    fn try_from(cli: Cli) -> Result<Self> {
        let listen_addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid listen address: {}", e)))?;

        if cli.database_max_connections == 0 {
            return Err(AppError::Config(
                "Database pool needs at least one connection".to_string(),
            ));
        }

        if cli.fetch_timeout_secs == 0 {
            return Err(AppError::Config(
                "Fetch timeout must be greater than zero".to_string(),
            ));
        }

        let countries_url = parse_source_url("countries", &cli.countries_url)?;
        let rates_url = parse_source_url("rates", &cli.rates_url)?;

        let origins: Vec<String> = cli
            .cors_allowed_origins
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let cors_origins = if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsOrigins::Any
        } else {
            for origin in &origins {
                Url::parse(origin)
                    .map_err(|e| AppError::Config(format!("Invalid CORS origin {}: {}", origin, e)))?;
            }
            CorsOrigins::List(origins)
        };

        let database_path = cli
            .database_path
            .unwrap_or_else(|| cli.data_dir.join("countries.db"));

        Ok(Self {
            listen_addr,
            data_dir: cli.data_dir,
            database_path,
            database_max_connections: cli.database_max_connections,
            countries_url,
            rates_url,
            fetch_timeout: Duration::from_secs(cli.fetch_timeout_secs),
            cors_origins,
        })
    }
}

fn parse_source_url(source: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("Invalid {} source URL: {}", source, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "Unsupported scheme for {} source URL: {}",
            source, other
        ))),
    }
}
