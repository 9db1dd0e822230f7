use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{ApiKey, BingConfig};

use super::results::extract_results;
use super::types::{SearchResponse, SearchResult};

/// Market parameter sent with every search request.
pub const DEFAULT_MARKET: &str = "en-GB";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum BingError {
    #[error("search API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction for web search. Implemented by `BingClient` for production;
/// mock implementations used in tests.
pub trait WebSearch {
    async fn search(&self, query: &str, count: u8) -> Result<Vec<SearchResult>, BingError>;
}

#[derive(Clone)]
pub struct BingClient {
    http: Client,
    subscription_key: ApiKey,
    endpoint: String,
}

impl BingClient {
    pub fn new(http: Client, config: &BingConfig) -> Self {
        Self {
            http,
            subscription_key: config.subscription_key.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            subscription_key: ApiKey::from("test-key".to_string()),
            endpoint: format!("{base_url}/v7.0/search"),
        }
    }

    async fn search_page(&self, query: &str, count: u8) -> Result<SearchResponse, BingError> {
        let params: [(&str, String); 6] = [
            ("q", query.to_string()),
            ("mkt", DEFAULT_MARKET.to_string()),
            ("count", count.to_string()),
            ("offset", "0".to_string()),
            ("safesearch", "Moderate".to_string()),
            ("answerCount", "3".to_string()),
        ];

        let response = self
            .http
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", self.subscription_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .query(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Bing API rate limited");
            return Err(BingError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Bing API error");
            return Err(BingError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", snippet(&text)),
            });
        }

        let body: SearchResponse = response.json().await?;
        debug!(query = %query, "bing search complete");
        Ok(body)
    }
}

impl WebSearch for BingClient {
    async fn search(&self, query: &str, count: u8) -> Result<Vec<SearchResult>, BingError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.search_page(query, count).await {
                Ok(response) => return Ok(extract_results(&response)),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < MAX_RETRIES {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying after transient error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(BingError::RateLimited))
    }
}

fn is_retriable(e: &BingError) -> bool {
    matches!(
        e,
        BingError::RateLimited
            | BingError::Api {
                code: 500..=599,
                ..
            }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}

/// First 200 characters of an error body, respecting char boundaries.
fn snippet(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
