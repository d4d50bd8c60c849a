/// A chat message as delivered by a message feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub sender_name: String,
    pub text: String,
    pub timestamp_ms: i64,
    pub is_outgoing: bool,
}

impl Message {
    /// Returns the single-line representation used by console rendering.
    pub fn display_line(&self) -> String {
        let direction = if self.is_outgoing { ">" } else { "<" };
        format!("{direction} #{} {}: {}", self.id, self.sender_name, self.text)
    }
}
