//! Conflict records and resolution choices.

use quotesync_core::{Quote, QuoteId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A same-id pair whose content fields disagree.
///
/// Holds snapshots of both sides as they were when the merge ran, never
/// references into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    /// Id of the quote in conflict.
    pub id: QuoteId,
    /// Local snapshot.
    pub local: Quote,
    /// Server snapshot.
    pub server: Quote,
    /// When the merge detected the conflict, epoch milliseconds.
    pub detected_at: i64,
    /// Whether a resolution has been applied.
    #[serde(default)]
    pub resolved: bool,
}

impl ConflictRecord {
    /// Creates an unresolved conflict between two copies of the same quote.
    pub fn new(local: Quote, server: Quote, detected_at: i64) -> Self {
        debug_assert_eq!(local.id, server.id);
        Self {
            id: local.id.clone(),
            local,
            server,
            detected_at,
            resolved: false,
        }
    }

    /// Returns the snapshot for `choice`.
    pub fn snapshot(&self, choice: ConflictChoice) -> &Quote {
        match choice {
            ConflictChoice::Server => &self.server,
            ConflictChoice::Local => &self.local,
        }
    }

    /// Returns true if the server copy is strictly newer.
    pub fn server_is_newer(&self) -> bool {
        self.server.timestamp > self.local.timestamp
    }

    /// Names of the content fields that differ.
    pub fn differing_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.local.text != self.server.text {
            fields.push("text");
        }
        if self.local.author != self.server.author {
            fields.push("author");
        }
        if self.local.category != self.server.category {
            fields.push("category");
        }
        fields
    }

    /// Marks the conflict as resolved.
    pub fn resolve(&mut self) {
        self.resolved = true;
    }

    /// Returns true if the conflict has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Which side of a conflict to keep.
///
/// "Keep both" is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictChoice {
    /// Apply the server snapshot.
    Server,
    /// Keep the local snapshot.
    Local,
}

impl ConflictChoice {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictChoice::Server => "server",
            ConflictChoice::Local => "local",
        }
    }
}

impl fmt::Display for ConflictChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(ConflictChoice::Server),
            "local" => Ok(ConflictChoice::Local),
            other => Err(format!("unknown conflict choice: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> ConflictRecord {
        let local = Quote::new(QuoteId::new("q-1"), "A", "X", "Wisdom", 100);
        let server = Quote::new(QuoteId::new("q-1"), "B", "X", "Humor", 200);
        ConflictRecord::new(local, server, 300)
    }

    #[test]
    fn snapshot_by_choice() {
        let conflict = pair();
        assert_eq!(conflict.snapshot(ConflictChoice::Local).text, "A");
        assert_eq!(conflict.snapshot(ConflictChoice::Server).text, "B");
        assert!(conflict.server_is_newer());
    }

    #[test]
    fn differing_fields() {
        assert_eq!(pair().differing_fields(), vec!["text", "category"]);
    }

    #[test]
    fn resolve() {
        let mut conflict = pair();
        assert!(!conflict.is_resolved());
        conflict.resolve();
        assert!(conflict.is_resolved());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(pair()).unwrap();
        assert_eq!(json["detectedAt"], 300);
        assert_eq!(json["resolved"], false);
        assert_eq!(json["server"]["text"], "B");
    }

    #[test]
    fn choice_parsing() {
        assert_eq!("server".parse::<ConflictChoice>(), Ok(ConflictChoice::Server));
        assert_eq!("local".parse::<ConflictChoice>(), Ok(ConflictChoice::Local));
        assert!("both".parse::<ConflictChoice>().is_err());
        assert_eq!(ConflictChoice::Local.to_string(), "local");
    }
}
