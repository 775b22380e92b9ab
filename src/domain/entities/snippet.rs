use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short text entry shared publicly until it expires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: SnippetId,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet is no longer visible at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Unique identifier for snippets (database SERIAL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(i64);

impl SnippetId {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SnippetId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snippet_expiring_at(expires: DateTime<Utc>) -> Snippet {
        Snippet {
            id: SnippetId::new(1),
            title: "An old silent pond".to_string(),
            content: "An old silent pond...".to_string(),
            created: expires - Duration::days(7),
            expires,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();

        assert!(!snippet_expiring_at(now + Duration::seconds(1)).is_expired_at(now));
        assert!(snippet_expiring_at(now).is_expired_at(now));
        assert!(snippet_expiring_at(now - Duration::days(1)).is_expired_at(now));
    }

    #[test]
    fn test_snippet_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&SnippetId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
