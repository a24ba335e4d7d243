use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

/// Retrieves the raw body of a product page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher with a browser-like User-Agent, a per-request
/// timeout and bounded exponential-backoff retries.
pub struct HttpFetcher {
    client: Client,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Transcoded to UTF-8 using the Content-Type charset when one is given.
        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.into_bytes())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        // Delays are 2x, 4x, 8x ... the configured base delay.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.retry_delay_ms.max(1))
            .max_delay(Duration::from_secs(60))
            .take(self.retry_attempts.saturating_sub(1) as usize);

        let mut attempt = 0u32;
        RetryIf::spawn(
            strategy,
            || {
                attempt += 1;
                let current = attempt;
                async move {
                    self.fetch_once(url).await.map_err(|e| {
                        if current < self.retry_attempts && e.is_transient() {
                            warn!(
                                "Fetch attempt {}/{} failed for {}: {}",
                                current, self.retry_attempts, url, e
                            );
                        }
                        e
                    })
                }
            },
            AppError::is_transient,
        )
        .await
    }
}
