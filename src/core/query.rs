use serde::{Deserialize, Serialize};

pub const GUEST_USER: &str = "guest";

/// A question addressed to the assistant, tagged with the display name of
/// whoever asked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub user: String,
}

impl Query {
    #[must_use]
    pub fn new(text: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user: user.into(),
        }
    }

    #[must_use]
    pub fn as_guest(text: impl Into<String>) -> Self {
        Self::new(text, GUEST_USER)
    }

    /// Trims both fields. A query whose text is empty after trimming is
    /// invalid and yields `None`; an empty user falls back to `guest`.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }

        let user = self.user.trim();
        let user = if user.is_empty() { GUEST_USER } else { user };

        Some(Self {
            text: text.to_string(),
            user: user.to_string(),
        })
    }
}
