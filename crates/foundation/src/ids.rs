use std::fmt;

use serde::{Deserialize, Serialize};

/// Chapter identifier.
///
/// Doubles as the DOM id of the chapter container and as the join key between
/// scroll notifications and camera state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(String);

impl ChapterId {
    pub fn new(id: impl Into<String>) -> Self {
        ChapterId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChapterId {
    fn from(s: &str) -> Self {
        ChapterId(s.to_string())
    }
}

impl PartialEq<str> for ChapterId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ChapterId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::ChapterId;

    #[test]
    fn serializes_as_plain_string() {
        let id = ChapterId::new("intro");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"intro\"");
        let back: ChapterId = serde_json::from_str("\"intro\"").unwrap();
        assert_eq!(back, "intro");
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        assert!(ChapterId::new("  ").is_empty());
        assert!(!ChapterId::new("a").is_empty());
    }
}
