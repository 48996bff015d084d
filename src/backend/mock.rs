use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::error::BackendError;
use crate::backend::payload::ResponsePayload;
use crate::backend::{AnswerBackend, AnswerStream, StreamSignal};
use crate::core::query::Query;

#[derive(Debug)]
enum ScriptedStream {
    Signals(Vec<Result<StreamSignal, BackendError>>),
    /// A channel that opens but never produces; exercises the idle timeout.
    Silent,
    Unavailable(BackendError),
}

/// Scripted [`AnswerBackend`] for tests: queues of stream scripts and
/// single-shot answers, consumed in order, with every received query
/// recorded.
#[derive(Clone, Default)]
pub struct MockBackend {
    streams: Arc<Mutex<VecDeque<ScriptedStream>>>,
    answers: Arc<Mutex<VecDeque<Result<ResponsePayload, BackendError>>>>,
    stream_queries: Arc<Mutex<Vec<Query>>>,
    ask_queries: Arc<Mutex<Vec<Query>>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a stream that yields the fragments and then the done signal.
    #[must_use]
    pub fn with_fragments(self, fragments: &[&str]) -> Self {
        let mut signals: Vec<Result<StreamSignal, BackendError>> = fragments
            .iter()
            .map(|f| Ok(StreamSignal::Fragment((*f).to_string())))
            .collect();
        signals.push(Ok(StreamSignal::Done));
        self.push_stream(ScriptedStream::Signals(signals))
    }

    /// Queues a stream that yields the fragments and then dies without a
    /// done signal.
    #[must_use]
    pub fn with_interrupted_stream(self, fragments: &[&str]) -> Self {
        let mut signals: Vec<Result<StreamSignal, BackendError>> = fragments
            .iter()
            .map(|f| Ok(StreamSignal::Fragment((*f).to_string())))
            .collect();
        signals.push(Err(BackendError::Stream("connection reset".to_string())));
        self.push_stream(ScriptedStream::Signals(signals))
    }

    /// Queues a stream that ends (without error) before any done signal.
    #[must_use]
    pub fn with_truncated_stream(self, fragments: &[&str]) -> Self {
        let signals = fragments
            .iter()
            .map(|f| Ok(StreamSignal::Fragment((*f).to_string())))
            .collect();
        self.push_stream(ScriptedStream::Signals(signals))
    }

    #[must_use]
    pub fn with_silent_stream(self) -> Self {
        self.push_stream(ScriptedStream::Silent)
    }

    #[must_use]
    pub fn with_stream_unavailable(self) -> Self {
        self.push_stream(ScriptedStream::Unavailable(BackendError::ChannelUnavailable(
            "not supported".to_string(),
        )))
    }

    #[must_use]
    pub fn with_answer(self, value: serde_json::Value) -> Self {
        self.answers
            .lock()
            .push_back(Ok(ResponsePayload::new(value)));
        self
    }

    #[must_use]
    pub fn with_ask_error(self, error: BackendError) -> Self {
        self.answers.lock().push_back(Err(error));
        self
    }

    fn push_stream(self, script: ScriptedStream) -> Self {
        self.streams.lock().push_back(script);
        self
    }

    #[must_use]
    pub fn stream_queries(&self) -> Vec<Query> {
        self.stream_queries.lock().clone()
    }

    #[must_use]
    pub fn ask_queries(&self) -> Vec<Query> {
        self.ask_queries.lock().clone()
    }

    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.stream_queries.lock().len()
    }

    #[must_use]
    pub fn ask_count(&self) -> usize {
        self.ask_queries.lock().len()
    }
}

#[async_trait]
impl AnswerBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream(&self, query: &Query) -> Result<AnswerStream, BackendError> {
        self.stream_queries.lock().push(query.clone());

        let script = self.streams.lock().pop_front();
        match script {
            Some(ScriptedStream::Signals(signals)) => Ok(Box::pin(tokio_stream::iter(signals))),
            Some(ScriptedStream::Silent) => Ok(Box::pin(tokio_stream::pending())),
            Some(ScriptedStream::Unavailable(error)) => Err(error),
            None => Err(BackendError::ChannelUnavailable(
                "MockBackend: no scripted stream".to_string(),
            )),
        }
    }

    async fn ask(&self, query: &Query) -> Result<ResponsePayload, BackendError> {
        self.ask_queries.lock().push(query.clone());

        self.answers.lock().pop_front().unwrap_or_else(|| {
            Err(BackendError::Connection(
                "MockBackend: no scripted answer".to_string(),
            ))
        })
    }
}
