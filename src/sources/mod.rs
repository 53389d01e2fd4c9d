//! Upstream data source clients
//!
//! A source performs one GET and hands back the raw body. Decoding is the
//! refresh pipeline's job, so a source never looks inside the payload.

pub mod types;
mod http;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpSource;

/// A single upstream endpoint
#[async_trait]
pub trait Source: Send + Sync {
    /// Short identifier used in logs and failure reports (e.g. "countries")
    fn id(&self) -> &str;

    /// Fetch the raw payload
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// The two upstreams a refresh reads from
#[derive(Clone)]
pub struct Sources {
    pub countries: Arc<dyn Source>,
    pub rates: Arc<dyn Source>,
}

impl Sources {
    pub fn new(countries: Arc<dyn Source>, rates: Arc<dyn Source>) -> Self {
        Self { countries, rates }
    }
}
