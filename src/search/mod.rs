pub mod links;

pub use links::extract_links;

use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::http::{BaseUrl, HttpClient, HttpConfig};

const SEARCH_PATH: &str = "/search";
const PEOPLE_PATH: &str = "/people";

/// Shown in place of an answer or source list the service left empty.
pub const EMPTY_FIELD_TEXT: &str = "—";

#[derive(Serialize)]
struct SearchBody<'a> {
    q: &'a str,
    want_prices: bool,
}

#[derive(Serialize)]
struct PeopleBody<'a> {
    name: &'a str,
}

/// One cited source. Both fields may be absent in the wire form; `label`
/// falls back to the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl Source {
    #[must_use]
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    ok: bool,
    answer: Option<String>,
    #[serde(default)]
    sources: Vec<Source>,
    latency_ms: Option<u64>,
    error: Option<String>,
}

/// A completed search: the answer text, the links found inside it, the
/// cited sources, and the service-reported latency.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub answer: String,
    pub links: Vec<String>,
    pub sources: Vec<Source>,
    pub latency_ms: Option<u64>,
}

/// Client for the companion search service. Unlike the ask paths, these are
/// plain request/response calls, so the retry middleware stays enabled.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: HttpClient,
    base_url: BaseUrl,
}

impl SearchClient {
    pub fn new(base_url: impl Into<BaseUrl>) -> Result<Self, BackendError> {
        Self::with_config(base_url, HttpConfig::default())
    }

    pub fn with_config(
        base_url: impl Into<BaseUrl>,
        config: HttpConfig,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            http: HttpClient::with_config(config)?,
            base_url: base_url.into(),
        })
    }

    pub async fn search(&self, query: &str, want_prices: bool) -> Result<SearchOutcome, BackendError> {
        let body = SearchBody {
            q: query,
            want_prices,
        };
        let envelope = self.post(SEARCH_PATH, &body).await?;

        let answer = envelope
            .answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| EMPTY_FIELD_TEXT.to_string());
        let links = extract_links(&answer);

        Ok(SearchOutcome {
            answer,
            links,
            sources: envelope.sources,
            latency_ms: envelope.latency_ms,
        })
    }

    pub async fn people(&self, name: &str) -> Result<Vec<Source>, BackendError> {
        let envelope = self.post(PEOPLE_PATH, &PeopleBody { name }).await?;
        Ok(envelope.sources)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope, BackendError> {
        let url = self.base_url.join(path);

        let response = self
            .http
            .post_json(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::server(status.as_u16(), message));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        if !envelope.ok {
            return Err(BackendError::Rejected(
                envelope.error.unwrap_or_else(|| "search_failed".to_string()),
            ));
        }

        Ok(envelope)
    }
}
