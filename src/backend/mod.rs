pub mod error;
pub mod http;
pub mod mock;
pub mod payload;

pub use error::BackendError;
pub use http::{HttpBackend, HttpClient, HttpConfig};
pub use mock::MockBackend;
pub use payload::{ANSWER_FIELDS, ResponsePayload};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::core::query::Query;

/// One item on the incremental delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    /// A partial-answer fragment, to be space-joined in arrival order.
    Fragment(String),
    /// The authoritative terminal signal; nothing after it is meaningful.
    Done,
}

pub type AnswerStream = BoxStream<'static, Result<StreamSignal, BackendError>>;

/// The two delivery channels a Bassam backend offers for one question.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Opens the incremental channel. An `Err` here means the channel could
    /// not be constructed at all; errors yielded by the stream itself mean
    /// the channel died after opening.
    async fn stream(&self, query: &Query) -> Result<AnswerStream, BackendError>;

    /// Single-shot request carrying the same query payload.
    async fn ask(&self, query: &Query) -> Result<ResponsePayload, BackendError>;
}
