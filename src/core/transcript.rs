use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
    System,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Bot => write!(f, "bot"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Stable handle to one transcript entry. Ids are monotonically increasing
/// per transcript and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Append-only message list. Entry text is plain data: callers render it
/// verbatim and must never reinterpret it as markup.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
        id
    }

    /// Replaces the text of an existing entry. Unknown ids are ignored: a
    /// request whose placeholder outlived the transcript has nothing to
    /// update.
    pub fn set_text(&mut self, id: EntryId, text: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().rfind(|e| e.id == id) {
            entry.text = text.into();
        }
    }

    #[must_use]
    pub fn text_of(&self, id: EntryId) -> Option<&str> {
        self.entries
            .iter()
            .rfind(|e| e.id == id)
            .map(|e| e.text.as_str())
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared transcript handle; one per session, cloned into each request
/// context.
pub type SharedTranscript = Arc<Mutex<Transcript>>;

#[must_use]
pub fn shared() -> SharedTranscript {
    Arc::new(Mutex::new(Transcript::new()))
}
