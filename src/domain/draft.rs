//! Unsent content for a single outgoing item.

/// A draft holding the single text field of an outgoing item.
///
/// Drafts are replaced, never mutated in place. The empty draft is the
/// distinguished "nothing to send" state.
pub trait Draft: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    fn from_text(text: String) -> Self;

    fn text(&self) -> &str;

    fn empty() -> Self {
        Self::from_text(String::new())
    }

    fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// Draft of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageToSend {
    pub text: String,
}

impl MessageToSend {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Draft for MessageToSend {
    fn from_text(text: String) -> Self {
        Self { text }
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Draft of a feed post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostToSend {
    pub message: String,
}

impl PostToSend {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Draft for PostToSend {
    fn from_text(message: String) -> Self {
        Self { message }
    }

    fn text(&self) -> &str {
        &self.message
    }
}
