use thiserror::Error;

/// Failures raised by an answer backend.
///
/// The session maps these onto the transcript: an unavailable or failed
/// channel triggers the fallback path when nothing was received, `Parse`
/// becomes the "no response" placeholder, everything else on the fallback
/// path becomes the fixed transport-error text. No variant is retried.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// True when the response arrived but its body could not be understood.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
