use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::{AnswerBackend, AnswerStream, StreamSignal};
use crate::core::accumulator::AnswerAccumulator;
use crate::core::query::Query;
use crate::core::transcript::{EntryId, SharedTranscript, Speaker, shared};

/// Shown in the bot entry until the first fragment or the fallback answer
/// lands.
pub const PENDING_PLACEHOLDER: &str = "…";
/// Shown when the single-shot response carried no recognized answer field
/// or could not be parsed.
pub const NO_ANSWER_TEXT: &str = "لم يصل رد.";
/// Shown when the single-shot request itself failed.
pub const FETCH_FAILED_TEXT: &str = "تعذر الحصول على الرد.";

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Identifies one submitted query in logs and handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(Uuid);

impl QueryId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// When false the incremental channel is never attempted and every
    /// submit goes straight to the single-shot path.
    pub streaming: bool,
    /// Maximum wait for the next stream item before the channel is treated
    /// as dead.
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            streaming: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Everything one in-flight request owns: its placeholder entry, its
/// accumulator, and a handle to the transcript it renders into. Contexts are
/// independent, so concurrent submissions never share state.
struct RequestContext {
    id: QueryId,
    holder: EntryId,
    transcript: SharedTranscript,
    accumulator: AnswerAccumulator,
}

impl RequestContext {
    fn append_fragment(&mut self, fragment: &str) {
        self.accumulator.push(fragment);
        self.transcript
            .lock()
            .set_text(self.holder, self.accumulator.as_str());
    }

    fn replace(&self, text: &str) {
        self.transcript.lock().set_text(self.holder, text);
    }

    fn has_content(&self) -> bool {
        !self.accumulator.is_empty()
    }
}

enum StreamOutcome {
    Completed,
    FailedEmpty,
    FailedAfterContent,
}

/// Handle to one in-flight question. Dropping it detaches the request;
/// `cancel` aborts it, leaving whatever was already rendered.
pub struct QueryHandle {
    id: QueryId,
    entry: EntryId,
    task: JoinHandle<()>,
}

impl QueryHandle {
    #[must_use]
    pub const fn id(&self) -> QueryId {
        self.id
    }

    /// The bot entry this request renders into.
    #[must_use]
    pub const fn entry(&self) -> EntryId {
        self.entry
    }

    /// Closes the channel by aborting the request task. The placeholder
    /// keeps its last rendered text.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Waits until the request reaches a terminal state (or was cancelled).
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Submits questions to a backend, preferring incremental delivery and
/// falling back to the single-shot endpoint when the channel is unavailable
/// or dies before producing anything.
///
/// All outcomes, including failures, surface as transcript text; nothing
/// propagates to the caller and nothing is retried.
pub struct AskSession {
    backend: Arc<dyn AnswerBackend>,
    transcript: SharedTranscript,
    config: SessionConfig,
}

impl AskSession {
    #[must_use]
    pub fn new(backend: Arc<dyn AnswerBackend>) -> Self {
        Self::with_config(backend, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(backend: Arc<dyn AnswerBackend>, config: SessionConfig) -> Self {
        Self {
            backend,
            transcript: shared(),
            config,
        }
    }

    #[must_use]
    pub fn transcript(&self) -> SharedTranscript {
        Arc::clone(&self.transcript)
    }

    /// Fire-and-forget submission. Returns `None` without side effects for
    /// queries that are empty after trimming; otherwise the user entry and
    /// the bot placeholder are in the transcript before this returns.
    pub fn submit(&self, query: Query) -> Option<QueryHandle> {
        let query = query.normalized()?;
        let id = QueryId::new();

        let holder = {
            let mut transcript = self.transcript.lock();
            transcript.push(Speaker::User, query.text.clone());
            transcript.push(Speaker::Bot, PENDING_PLACEHOLDER)
        };

        let ctx = RequestContext {
            id,
            holder,
            transcript: Arc::clone(&self.transcript),
            accumulator: AnswerAccumulator::new(),
        };

        tracing::debug!(query = %id, user = %query.user, "question submitted");

        let backend = Arc::clone(&self.backend);
        let streaming = self.config.streaming;
        let idle_timeout = self.config.idle_timeout;
        let task =
            tokio::spawn(async move { run_query(backend, query, ctx, streaming, idle_timeout).await });

        Some(QueryHandle {
            id,
            entry: holder,
            task,
        })
    }
}

async fn run_query(
    backend: Arc<dyn AnswerBackend>,
    query: Query,
    mut ctx: RequestContext,
    streaming: bool,
    idle_timeout: Duration,
) {
    if streaming {
        match backend.stream(&query).await {
            Ok(stream) => match drain_stream(stream, &mut ctx, idle_timeout).await {
                StreamOutcome::Completed | StreamOutcome::FailedAfterContent => return,
                StreamOutcome::FailedEmpty => {}
            },
            Err(e) => {
                tracing::debug!(query = %ctx.id, error = %e, "incremental channel unavailable");
            }
        }
    }

    run_fallback(backend.as_ref(), &query, &ctx).await;
}

/// Applies fragments in arrival order until the done signal. Dropping the
/// stream on return is what closes the channel, so a late error after done
/// is never observed.
async fn drain_stream(
    mut stream: AnswerStream,
    ctx: &mut RequestContext,
    idle_timeout: Duration,
) -> StreamOutcome {
    loop {
        let item = match tokio::time::timeout(idle_timeout, stream.next()).await {
            Ok(item) => item,
            Err(_) => {
                tracing::debug!(query = %ctx.id, "stream idle past {idle_timeout:?}");
                return failed(ctx);
            }
        };

        match item {
            Some(Ok(StreamSignal::Fragment(fragment))) => ctx.append_fragment(&fragment),
            Some(Ok(StreamSignal::Done)) => {
                tracing::debug!(query = %ctx.id, "stream completed");
                return StreamOutcome::Completed;
            }
            Some(Err(e)) => {
                tracing::debug!(query = %ctx.id, error = %e, "stream failed");
                return failed(ctx);
            }
            // Exhaustion without a done signal counts as a channel error.
            None => {
                tracing::debug!(query = %ctx.id, "stream ended without done signal");
                return failed(ctx);
            }
        }
    }
}

/// Partial content is kept as the final answer; only an empty accumulator
/// escalates to the fallback path.
fn failed(ctx: &RequestContext) -> StreamOutcome {
    if ctx.has_content() {
        StreamOutcome::FailedAfterContent
    } else {
        StreamOutcome::FailedEmpty
    }
}

async fn run_fallback(backend: &dyn AnswerBackend, query: &Query, ctx: &RequestContext) {
    tracing::debug!(query = %ctx.id, "falling back to single-shot request");

    match backend.ask(query).await {
        Ok(payload) => ctx.replace(payload.answer().unwrap_or(NO_ANSWER_TEXT)),
        Err(e) if e.is_parse() => {
            tracing::debug!(query = %ctx.id, error = %e, "single-shot response unreadable");
            ctx.replace(NO_ANSWER_TEXT);
        }
        Err(e) => {
            tracing::warn!(query = %ctx.id, error = %e, "single-shot request failed");
            ctx.replace(FETCH_FAILED_TEXT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[tokio::test]
    async fn test_submit_creates_entries_before_any_await() {
        let session = Arc::new(AskSession::new(Arc::new(
            MockBackend::new().with_silent_stream(),
        )));

        let handle = session.submit(Query::as_guest("hello")).unwrap();

        // inspected synchronously, before the spawned task can have run
        let transcript = session.transcript();
        let guard = transcript.lock();
        assert_eq!(guard.len(), 2);
        assert_eq!(guard.entries()[0].speaker, Speaker::User);
        assert_eq!(guard.entries()[0].text, "hello");
        assert_eq!(guard.entries()[1].speaker, Speaker::Bot);
        assert_eq!(guard.entries()[1].text, PENDING_PLACEHOLDER);
        assert_eq!(guard.entries()[1].id, handle.entry());
        drop(guard);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_handle_ids_are_unique() {
        let session = AskSession::new(Arc::new(
            MockBackend::new().with_fragments(&[]).with_fragments(&[]),
        ));

        let a = session.submit(Query::as_guest("one")).unwrap();
        let b = session.submit(Query::as_guest("two")).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.entry(), b.entry());

        a.wait().await;
        b.wait().await;
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert!(config.streaming);
        assert_eq!(config.idle_timeout, DEFAULT_IDLE_TIMEOUT);
    }
}
