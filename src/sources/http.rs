//! reqwest-backed source

use crate::error::{AppError, Result};
use crate::sources::Source;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches one URL over HTTP
pub struct HttpSource {
    id: String,
    url: Url,
    client: Client,
}

impl HttpSource {
    pub fn new(id: impl Into<String>, url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            id: id.into(),
            url,
            client,
        })
    }
}

#[async_trait]
impl Source for HttpSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::debug!("Fetching {} from {}", self.id, self.url);

        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                source_id: self.id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), self.id);

        Ok(body.to_vec())
    }
}
