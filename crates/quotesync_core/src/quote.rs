//! Quote records.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Identifier of a quote.
///
/// Locally created quotes get a random UUID; quotes that arrive from the
/// server keep whatever identity the server assigned.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuoteId({})", self.0)
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QuoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for QuoteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Where the current copy of a quote came from.
///
/// Only a merge hint: the merge never trusts it on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Created or edited locally and not yet acknowledged by the server.
    #[default]
    Local,
    /// Taken from the server copy.
    Server,
    /// Local and server copies agree.
    Synced,
}

impl QuoteSource {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteSource::Local => "local",
            QuoteSource::Server => "server",
            QuoteSource::Synced => "synced",
        }
    }
}

/// A quote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique identifier within a store.
    pub id: QuoteId,
    /// The quote itself.
    pub text: String,
    /// Who said it.
    pub author: String,
    /// Category used for filtering.
    pub category: String,
    /// Creation or last modification time, epoch milliseconds.
    pub timestamp: i64,
    /// Provenance of this copy.
    #[serde(default)]
    pub source: QuoteSource,
    /// Timestamp up to which this record is known to match the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<i64>,
}

impl Quote {
    /// Creates a new local quote.
    pub fn new(
        id: QuoteId,
        text: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            author: author.into(),
            category: category.into(),
            timestamp,
            source: QuoteSource::Local,
            last_synced: None,
        }
    }

    /// Returns a copy with the given source.
    #[must_use]
    pub fn with_source(mut self, source: QuoteSource) -> Self {
        self.source = source;
        self
    }

    /// Returns a copy with the given last-synced marker.
    #[must_use]
    pub fn with_last_synced(mut self, last_synced: Option<i64>) -> Self {
        self.last_synced = last_synced;
        self
    }

    /// Returns true if `text`, `author` and `category` all match.
    ///
    /// Identity, timestamps and provenance are ignored.
    pub fn same_content(&self, other: &Quote) -> bool {
        self.text == other.text && self.author == other.author && self.category == other.category
    }

    /// Returns true if this record has changes the server has not seen.
    pub fn needs_push(&self) -> bool {
        self.source == QuoteSource::Local
            || self.last_synced.map_or(true, |synced| synced < self.timestamp)
    }

    /// Marks this record as acknowledged by the server at `now`.
    pub fn mark_synced(&mut self, now: i64) {
        self.source = QuoteSource::Synced;
        self.last_synced = Some(now.max(self.timestamp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Quote {
        Quote::new(QuoteId::new("q-1"), "A", "X", "Wisdom", 100)
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(QuoteId::generate(), QuoteId::generate());
    }

    #[test]
    fn serializes_with_camel_case_and_lowercase_source() {
        let quote = sample().with_last_synced(Some(90));
        let json = serde_json::to_value(&quote).unwrap();

        assert_eq!(json["id"], "q-1");
        assert_eq!(json["source"], "local");
        assert_eq!(json["lastSynced"], 90);
    }

    #[test]
    fn absent_last_synced_is_omitted() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("lastSynced"));
    }

    #[test]
    fn missing_source_defaults_to_local() {
        let quote: Quote = serde_json::from_str(
            r#"{"id":"s-1","text":"B","author":"Y","category":"C","timestamp":5}"#,
        )
        .unwrap();
        assert_eq!(quote.source, QuoteSource::Local);
        assert_eq!(quote.last_synced, None);
    }

    #[test]
    fn same_content_ignores_metadata() {
        let a = sample();
        let b = Quote {
            timestamp: 999,
            source: QuoteSource::Server,
            ..sample()
        };
        assert!(a.same_content(&b));

        let c = Quote {
            category: "Humor".into(),
            ..sample()
        };
        assert!(!a.same_content(&c));
    }

    #[test]
    fn needs_push_rules() {
        assert!(sample().needs_push());

        let mut synced = sample();
        synced.mark_synced(150);
        assert_eq!(synced.source, QuoteSource::Synced);
        assert!(!synced.needs_push());

        // Edited after the last sync
        synced.timestamp = 200;
        assert!(synced.needs_push());

        let from_server = sample()
            .with_source(QuoteSource::Server)
            .with_last_synced(Some(100));
        assert!(!from_server.needs_push());
    }

    #[test]
    fn mark_synced_never_predates_timestamp() {
        let mut quote = sample();
        quote.mark_synced(50);
        assert_eq!(quote.last_synced, Some(100));
    }
}
