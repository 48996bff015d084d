use serde::{Deserialize, Serialize};

/// Field names the single-shot endpoint may carry its answer under, in
/// precedence order. Older deployments answered under `result`; current ones
/// use `answer`. The first non-empty string wins.
pub const ANSWER_FIELDS: &[&str] = &["answer", "result"];

/// Body of a single-shot response, kept as raw JSON so the answer lookup is
/// driven by [`ANSWER_FIELDS`] rather than a fixed struct shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponsePayload(serde_json::Value);

impl ResponsePayload {
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The first present, non-empty string among [`ANSWER_FIELDS`]. Values
    /// of any other JSON type do not count as answers.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        ANSWER_FIELDS
            .iter()
            .find_map(|field| self.0.get(*field)?.as_str().filter(|s| !s.is_empty()))
    }
}

impl From<serde_json::Value> for ResponsePayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
