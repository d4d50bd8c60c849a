/// A post in a public feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub author: String,
    pub body: String,
    pub timestamp_ms: i64,
}

impl Post {
    pub fn display_line(&self) -> String {
        format!("#{} [{}] {}", self.id, self.author, self.body)
    }
}
