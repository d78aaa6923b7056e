use serde::{Deserialize, Serialize};

use crate::UtcDateTime;

/// A unit of scanned text: a forum post or a news headline.
///
/// `source` names where the text came from (a community for forum posts, the
/// publisher for headlines). `body` is empty for headlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDocument {
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub url: String,
    #[serde(default)]
    pub score: i64,
    pub published_at: Option<UtcDateTime>,
}

impl TextDocument {
    pub fn new(source: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            body: String::new(),
            url: url.into(),
            score: 0,
            published_at: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn with_published_at(mut self, published_at: UtcDateTime) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Title and body joined by a single space, the text scored for posts.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }

    /// Case-insensitive substring test against title and body.
    pub fn mentions(&self, needle_upper: &str) -> bool {
        self.title.to_uppercase().contains(needle_upper)
            || self.body.to_uppercase().contains(needle_upper)
    }
}
