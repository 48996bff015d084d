pub mod sse;

pub use sse::SseDecoder;

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use reqwest_retry::policies::ExponentialBackoff;
use serde::Serialize;

use crate::backend::error::BackendError;
use crate::backend::payload::ResponsePayload;
use crate::backend::{AnswerBackend, AnswerStream, StreamSignal};
use crate::core::query::Query;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const STREAM_PATH: &str = "/ask/stream";
const ASK_PATH: &str = "/api/ask";

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Bounds single-shot requests only. Streaming requests stay open as
    /// long as the channel produces; the session's idle timeout covers
    /// hung streams.
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_min_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(10),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.max_retries = 0;
        self
    }
}

/// Base address of the Bassam deployment, with trailing slashes stripped so
/// `join` stays predictable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Cow<'static, str>);

impl BaseUrl {
    #[must_use]
    pub fn new(url: impl Into<Cow<'static, str>>) -> Self {
        let url = url.into();
        if url.ends_with('/') {
            Self(Cow::Owned(url.trim_end_matches('/').to_string()))
        } else {
            Self(url)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_BASE_URL))
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BaseUrl {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl From<String> for BaseUrl {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Two reqwest clients behind one handle: a retry-wrapped one for JSON
/// calls, and a plain one for long-lived streams where a whole-request
/// timeout would kill the channel mid-answer.
#[derive(Clone)]
pub struct HttpClient {
    json: ClientWithMiddleware,
    streaming: Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new() -> Result<Self, BackendError> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self, BackendError> {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(config.retry_min_delay, config.retry_max_delay)
            .build_with_max_retries(config.max_retries);

        let mut json_builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);
        let mut stream_builder = Client::builder().connect_timeout(config.connect_timeout);

        if let Some(ref ua) = config.user_agent {
            json_builder = json_builder.user_agent(ua);
            stream_builder = stream_builder.user_agent(ua);
        }

        let json_inner = json_builder
            .build()
            .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {e}")))?;
        let streaming = stream_builder
            .build()
            .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let json = ClientBuilder::new(json_inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            json,
            streaming,
            config,
        })
    }

    #[must_use]
    pub fn post_json(&self, url: &str) -> reqwest_middleware::RequestBuilder {
        self.json.post(url)
    }

    #[must_use]
    pub fn stream_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.streaming.get(url)
    }

    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AskBody<'a> {
    q: &'a str,
    user: &'a str,
}

/// [`AnswerBackend`] over the deployed Bassam HTTP service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: HttpClient,
    base_url: BaseUrl,
}

impl HttpBackend {
    /// Ask-path failures are terminal for their query, so the retry
    /// middleware is disabled here regardless of the supplied config.
    pub fn new(base_url: impl Into<BaseUrl>) -> Result<Self, BackendError> {
        Self::with_config(base_url, HttpConfig::default())
    }

    pub fn with_config(
        base_url: impl Into<BaseUrl>,
        config: HttpConfig,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            http: HttpClient::with_config(config.without_retries())?,
            base_url: base_url.into(),
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    fn status_error(status: reqwest::StatusCode, body: &str) -> BackendError {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["error", "detail"]
                    .iter()
                    .find_map(|f| v.get(*f)?.as_str().map(String::from))
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        BackendError::server(status.as_u16(), message)
    }
}

#[async_trait]
impl AnswerBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn stream(&self, query: &Query) -> Result<AnswerStream, BackendError> {
        let url = self.base_url.join(STREAM_PATH);

        let response = self
            .http
            .stream_get(&url)
            .query(&[("q", query.text.as_str()), ("user", query.user.as_str())])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| BackendError::ChannelUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::ChannelUnavailable(format!("HTTP {status}")));
        }

        // Unnamed events carry fragments, `done` closes the answer, any
        // other named event has no listener here.
        let signals = sse::decode_stream(response.bytes_stream()).filter_map(|item| async move {
            match item {
                Ok(event) if event.is_named("done") => Some(Ok(StreamSignal::Done)),
                Ok(event) if event.is_message() => Some(Ok(StreamSignal::Fragment(event.data))),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(signals))
    }

    async fn ask(&self, query: &Query) -> Result<ResponsePayload, BackendError> {
        let url = self.base_url.join(ASK_PATH);
        let body = AskBody {
            q: &query.text,
            user: &query.user,
        };

        let response = self
            .http
            .post_json(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &error_body));
        }

        response
            .json::<ResponsePayload>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_http_config_builder() {
        let config = HttpConfig::new()
            .with_request_timeout(Duration::from_secs(5))
            .with_user_agent("bassam/0.1.0")
            .without_retries();

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, Some("bassam/0.1.0".to_string()));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_base_url_strips_trailing_slashes() {
        assert_eq!(BaseUrl::new("http://host:8000/").as_str(), "http://host:8000");
        assert_eq!(BaseUrl::new("http://host///").as_str(), "http://host");
    }

    #[test]
    fn test_base_url_join() {
        let base = BaseUrl::new("http://host:8000");
        assert_eq!(base.join("/ask/stream"), "http://host:8000/ask/stream");
    }

    #[test]
    fn test_backend_creation() {
        let backend = HttpBackend::new(DEFAULT_BASE_URL);
        assert!(backend.is_ok());
    }

    #[test]
    fn test_status_error_reads_error_field() {
        let err = HttpBackend::status_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error": "brain offline"}"#,
        );
        match err {
            BackendError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "brain offline");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[test]
    fn test_status_error_reads_detail_field() {
        let err =
            HttpBackend::status_error(reqwest::StatusCode::NOT_FOUND, r#"{"detail": "no route"}"#);
        assert_eq!(err.to_string(), "server error (404): no route");
    }

    #[test]
    fn test_status_error_falls_back_to_status_line() {
        let err = HttpBackend::status_error(reqwest::StatusCode::BAD_GATEWAY, "not json");
        assert!(err.to_string().contains("502"));
    }
}
