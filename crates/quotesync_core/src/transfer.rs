//! JSON and CSV export, JSON import.

use crate::error::{CoreError, CoreResult};
use crate::quote::{Quote, QuoteId, QuoteSource};
use crate::store::QuoteStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A loosely-typed quote as found in import files and older stores.
///
/// Only `text` and `author` are required to carry content; everything else is
/// filled in when the record is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Existing identifier, if any.
    #[serde(default)]
    pub id: Option<QuoteId>,
    /// Quote text.
    #[serde(default)]
    pub text: String,
    /// Quote author.
    #[serde(default)]
    pub author: String,
    /// Category; the store default applies when absent or empty.
    #[serde(default)]
    pub category: Option<String>,
    /// Modification time, epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Provenance.
    #[serde(default)]
    pub source: Option<QuoteSource>,
    /// Last-synced marker.
    #[serde(default)]
    pub last_synced: Option<i64>,
}

impl QuoteRecord {
    /// Converts into a quote, or `None` if text or author is empty.
    ///
    /// Missing ids are generated and missing timestamps become `now`.
    pub fn into_quote(self, now: i64, default_category: &str) -> Option<Quote> {
        let text = self.text.trim();
        let author = self.author.trim();
        if text.is_empty() || author.is_empty() {
            return None;
        }

        let category = match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => default_category.to_string(),
        };

        Some(Quote {
            id: self.id.unwrap_or_else(QuoteId::generate),
            text: text.to_string(),
            author: author.to_string(),
            category,
            timestamp: self.timestamp.unwrap_or(now),
            source: self.source.unwrap_or_default(),
            last_synced: self.last_synced,
        })
    }
}

/// Outcome of [`QuoteStore::import_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records added to the store.
    pub imported: usize,
    /// Records skipped for an empty text or author.
    pub skipped_invalid: usize,
    /// Records skipped because their id was already present.
    pub skipped_duplicate: usize,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    text: &'a str,
    author: &'a str,
    category: &'a str,
    timestamp: i64,
    source: &'a str,
}

impl QuoteStore {
    /// Exports every quote as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self.quotes())?)
    }

    /// Exports every quote as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be written.
    pub fn export_csv(&self) -> CoreResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for quote in self.quotes() {
            writer.serialize(CsvRow {
                id: quote.id.as_str(),
                text: &quote.text,
                author: &quote.author,
                category: &quote.category,
                timestamp: quote.timestamp,
                source: quote.source.as_str(),
            })?;
        }
        if self.is_empty() {
            writer.write_record(["id", "text", "author", "category", "timestamp", "source"])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Csv(csv::Error::from(e.into_error())))?;
        String::from_utf8(bytes).map_err(|e| CoreError::Validation {
            field: "csv",
            message: e.to_string(),
        })
    }

    /// Imports quotes from a JSON array.
    ///
    /// Invalid and duplicate records are skipped and counted. The store is
    /// written once for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON, or a storage error
    /// if the write fails. Either leaves the store unchanged.
    pub fn import_json(&mut self, json: &str) -> CoreResult<ImportSummary> {
        let records: Vec<QuoteRecord> = serde_json::from_str(json)?;
        let now = self.now_millis();
        let default_category = self.default_category().to_string();

        let mut seen: HashSet<QuoteId> = self.quotes().iter().map(|q| q.id.clone()).collect();
        let mut next = self.quotes().to_vec();
        let mut summary = ImportSummary::default();

        for record in records {
            let Some(quote) = record.into_quote(now, &default_category) else {
                summary.skipped_invalid += 1;
                continue;
            };
            if !seen.insert(quote.id.clone()) {
                summary.skipped_duplicate += 1;
                continue;
            }
            next.push(Quote {
                source: QuoteSource::Local,
                last_synced: None,
                ..quote
            });
            summary.imported += 1;
        }

        if summary.imported > 0 {
            self.commit(next)?;
        }

        tracing::info!(
            imported = summary.imported,
            skipped_invalid = summary.skipped_invalid,
            skipped_duplicate = summary.skipped_duplicate,
            "imported quotes"
        );
        Ok(summary)
    }
}
