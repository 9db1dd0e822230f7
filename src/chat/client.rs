use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ApiKey, AzureOpenAiConfig};

use super::types::{ChatMessage, ChatRequest, ChatResponse};

/// Completion token cap, matching the deployment's configured limit.
pub const MAX_COMPLETION_TOKENS: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid Azure OpenAI endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("chat API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("chat API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("chat API returned no choices")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction for a single chat-completion turn. Implemented by
/// `ChatClient` for production; mock implementations used in tests.
pub trait ChatCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ChatError>;
}

#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    api_key: ApiKey,
    url: String,
    api_version: String,
}

impl ChatClient {
    pub fn new(http: Client, config: &AzureOpenAiConfig) -> Result<Self, ChatError> {
        Url::parse(&config.endpoint)
            .map_err(|e| ChatError::InvalidEndpoint(format!("{}: {e}", config.endpoint)))?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            config.endpoint.trim_end_matches('/'),
            config.deployment
        );
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            url,
            api_version: config.api_version.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::from("test-key".to_string()),
            url: format!("{base_url}/openai/deployments/test-deploy/chat/completions"),
            api_version: "2023-05-15".to_string(),
        }
    }

    async fn create_completion(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<ChatResponse, ChatError> {
        let request = ChatRequest {
            messages: messages.to_vec(),
            temperature,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .http
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("chat API rate limited");
            return Err(ChatError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ChatResponse>(&text)
                && let Some(err) = &body.error
            {
                let message = err
                    .message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string());
                warn!(status = %status, error = %message, "chat API error");
                return Err(ChatError::Api {
                    code: status.as_u16(),
                    message,
                });
            }
            warn!(status = %status, "chat API error (no structured body)");
            return Err(ChatError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", snippet(&text)),
            });
        }

        let body: ChatResponse = response.json().await?;
        debug!("chat completion received");
        Ok(body)
    }
}

impl ChatCompletion for ChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ChatError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.create_completion(messages, temperature).await {
                Ok(response) => return extract_content(response),
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
        Err(last_err.unwrap_or(ChatError::RateLimited))
    }
}

fn extract_content(response: ChatResponse) -> Result<String, ChatError> {
    response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message)
        .map(|message| message.content)
        .filter(|content| !content.is_empty())
        .ok_or(ChatError::EmptyResponse)
}

fn is_retriable(e: &ChatError) -> bool {
    matches!(
        e,
        ChatError::RateLimited
            | ChatError::Api {
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


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_success_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/test-deploy/chat/completions"))
            .and(header("api-key", "test-key"))
            .and(query_param("api-version", "2023-05-15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "The incumbent president is **Joe Biden**."
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = ChatClient::with_base_url(Client::new(), &server.uri());
        let content = client
            .complete(&[ChatMessage::user("who is the president?")], 0.0)
            .await
            .unwrap();

        assert_eq!(content, "The incumbent president is **Joe Biden**.");
    }

    #[tokio::test]
    async fn complete_429_returns_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/test-deploy/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = ChatClient::with_base_url(Client::new(), &server.uri());
        let result = client.complete(&[ChatMessage::user("q")], 0.0).await;
        assert!(matches!(result, Err(ChatError::RateLimited)));
    }

    #[tokio::test]
    async fn complete_400_with_error_body_uses_its_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/test-deploy/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "code": "context_length_exceeded",
                    "message": "This model's maximum context length is exceeded"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::with_base_url(Client::new(), &server.uri());
        let result = client.complete(&[ChatMessage::user("q")], 0.0).await;
        match &result {
            Err(ChatError::Api { code: 400, message }) => {
                assert!(message.contains("maximum context length"));
            }
            other => panic!("expected Api(400) with body message, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_no_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/test-deploy/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = ChatClient::with_base_url(Client::new(), &server.uri());
        let result = client.complete(&[ChatMessage::user("q")], 0.0).await;
        assert!(matches!(result, Err(ChatError::EmptyResponse)));
    }
}
