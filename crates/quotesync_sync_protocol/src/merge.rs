//! Last-write-wins merge of local and server quote lists.

use crate::conflict::ConflictRecord;
use quotesync_core::{Quote, QuoteId, QuoteSource};
use std::collections::{HashMap, HashSet};

/// Result of a merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Merged list: local order first, then new server quotes in server order.
    pub quotes: Vec<Quote>,
    /// Conflicts detected by this pass.
    pub conflicts: Vec<ConflictRecord>,
    /// Server quotes that had no local counterpart.
    pub new_count: usize,
    /// Matched quotes whose merged copy is the server copy.
    pub updated_count: usize,
}

impl MergeOutcome {
    /// Number of conflicts detected.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

/// Merges `server` into `local`.
///
/// Pure and deterministic: the same inputs always give the same outcome.
/// `detected_at` stamps any conflict records. When the server list repeats
/// an id, the first occurrence wins.
pub fn merge(local: &[Quote], server: &[Quote], detected_at: i64) -> MergeOutcome {
    let mut by_id: HashMap<&QuoteId, &Quote> = HashMap::with_capacity(server.len());
    for quote in server {
        by_id.entry(&quote.id).or_insert(quote);
    }

    let mut outcome = MergeOutcome {
        quotes: Vec::with_capacity(local.len() + server.len()),
        ..MergeOutcome::default()
    };
    let mut matched: HashSet<&QuoteId> = HashSet::with_capacity(local.len());

    for ours in local {
        let Some(&theirs) = by_id.get(&ours.id) else {
            outcome.quotes.push(ours.clone());
            continue;
        };
        matched.insert(&ours.id);

        let server_newer = theirs.timestamp > ours.timestamp;
        if ours.same_content(theirs) {
            let merged = if server_newer {
                outcome.updated_count += 1;
                theirs.clone()
            } else {
                ours.clone()
            };
            let synced_at = merged.timestamp;
            outcome.quotes.push(
                merged
                    .with_source(QuoteSource::Synced)
                    .with_last_synced(Some(synced_at)),
            );
        } else {
            outcome
                .conflicts
                .push(ConflictRecord::new(ours.clone(), theirs.clone(), detected_at));
            if server_newer {
                outcome.updated_count += 1;
                outcome.quotes.push(server_copy(theirs));
            } else {
                outcome.quotes.push(ours.clone());
            }
        }
    }

    let mut appended: HashSet<&QuoteId> = HashSet::new();
    for theirs in server {
        if matched.contains(&theirs.id) || !appended.insert(&theirs.id) {
            continue;
        }
        outcome.quotes.push(server_copy(theirs));
        outcome.new_count += 1;
    }

    outcome
}

fn server_copy(quote: &Quote) -> Quote {
    quote
        .clone()
        .with_source(QuoteSource::Server)
        .with_last_synced(Some(quote.timestamp))
}
