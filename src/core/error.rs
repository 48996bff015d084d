use thiserror::Error;

/// Crate-level error for the CLI paths. Session submissions never surface
/// errors here: their failures end as transcript text.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("backend error: {0}")]
    Backend(#[from] crate::backend::BackendError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
