use bytes::Bytes;
use futures::future;
use futures::stream::{Stream, StreamExt};

use crate::backend::error::BackendError;

/// One dispatched server-sent event: an optional event name and the joined
/// data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub name: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// True for events an `onmessage`-style consumer would see: unnamed
    /// events and those explicitly named `message`.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.name.as_deref().is_none_or(|n| n == "message")
    }

    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// Incremental `text/event-stream` decoder, safe against events split across
/// arbitrary chunk boundaries.
///
/// Recognizes `event:` and `data:` fields; `id:`, `retry:` and comment lines
/// are consumed and dropped. An event is dispatched on the first empty line
/// after at least one `data:` line, with multi-line data joined by `\n`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    // raw bytes, so a multi-byte character split across chunks survives
    pending: Vec<u8>,
    event_name: Option<String>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            if let Some(event) = self.handle_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn handle_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // keep-alive comment
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_name = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            self.event_name = None;
            return None;
        }
        Some(SseEvent {
            name: self.event_name.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        })
    }
}

/// Lifts a byte stream into a stream of decoded events. Transport errors
/// surface as [`BackendError::Stream`] items; decoding state carries across
/// chunks.
pub fn decode_stream<S>(bytes: S) -> impl Stream<Item = Result<SseEvent, BackendError>>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    bytes
        .scan(SseDecoder::new(), |decoder, chunk| {
            let items: Vec<Result<SseEvent, BackendError>> = match chunk {
                Ok(bytes) => decoder.feed(&bytes).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(BackendError::Stream(e.to_string()))],
            };
            future::ready(Some(items))
        })
        .flat_map(futures::stream::iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_data_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: hello\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
        assert!(events[0].is_message());
    }

    #[test]
    fn test_named_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: done\ndata: end\n\n");

        assert_eq!(events.len(), 1);
        assert!(events[0].is_named("done"));
        assert!(!events[0].is_message());
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(b"data: hel").is_empty());
        assert!(decoder.feed(b"lo wor").is_empty());
        let events = decoder.feed(b"ld\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello world");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        // "م" is 0xD9 0x85; the chunk boundary falls inside it
        assert!(decoder.feed(b"data: \xD9").is_empty());
        let events = decoder.feed(b"\x85\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "م");
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: one\n\ndata: two\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "one");
        assert_eq!(events[1].data, "two");
    }

    #[test]
    fn test_multi_line_data_joined_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: first\ndata: second\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn test_crlf_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: hi\r\n\r\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn test_comment_lines_dropped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\ndata: real\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "real");
    }

    #[test]
    fn test_id_and_retry_fields_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"id: 7\nretry: 500\ndata: x\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
        assert!(events[0].name.is_none());
    }

    #[test]
    fn test_blank_line_without_data_dispatches_nothing() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: ping\n\n");
        assert!(events.is_empty());

        // the stale event name must not leak into the next event
        let events = decoder.feed(b"data: later\n\n");
        assert_eq!(events.len(), 1);
        assert!(events[0].name.is_none());
    }

    #[test]
    fn test_value_without_space_after_colon() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data:tight\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "tight");
    }

    #[test]
    fn test_unterminated_event_stays_buffered() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: pending\n").is_empty());
        let events = decoder.feed(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "pending");
    }

    #[tokio::test]
    async fn test_decode_stream_carries_state_across_chunks() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: a")),
            Ok(Bytes::from_static(b"b\n\nevent: done\ndata: end\n\n")),
        ];
        let events: Vec<_> = decode_stream(futures::stream::iter(chunks))
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().data, "ab");
        assert!(events[1].as_ref().unwrap().is_named("done"));
    }
}
