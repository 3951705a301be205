//! Property tests for the merge algorithm.

use proptest::prelude::*;
use quotesync_core::{Quote, QuoteSource};
use quotesync_sync_protocol::{merge, ConflictChoice};
use quotesync_testkit::{merge_input_strategy, quote};
use std::collections::{HashMap, HashSet};

proptest! {
    #[test]
    fn unmatched_local_quotes_survive_unchanged((local, server) in merge_input_strategy()) {
        let server_ids: HashSet<_> = server.iter().map(|q| &q.id).collect();
        let outcome = merge(&local, &server, 0);

        for ours in local.iter().filter(|q| !server_ids.contains(&q.id)) {
            prop_assert!(outcome.quotes.contains(ours));
        }
    }

    #[test]
    fn unmatched_server_quotes_appear_once_as_server((local, server) in merge_input_strategy()) {
        let local_ids: HashSet<_> = local.iter().map(|q| &q.id).collect();
        let outcome = merge(&local, &server, 0);

        for theirs in server.iter().filter(|q| !local_ids.contains(&q.id)) {
            let copies: Vec<&Quote> = outcome.quotes.iter().filter(|q| q.id == theirs.id).collect();
            prop_assert_eq!(copies.len(), 1);
            prop_assert_eq!(copies[0].source, QuoteSource::Server);
            prop_assert!(copies[0].same_content(theirs));
        }
    }

    #[test]
    fn conflict_iff_content_differs((local, server) in merge_input_strategy()) {
        let by_id: HashMap<_, _> = server.iter().map(|q| (&q.id, q)).collect();
        let outcome = merge(&local, &server, 0);
        let conflicted: HashSet<_> = outcome.conflicts.iter().map(|c| &c.id).collect();

        for ours in &local {
            let expected = by_id.get(&ours.id).is_some_and(|theirs| !ours.same_content(theirs));
            prop_assert_eq!(conflicted.contains(&ours.id), expected);
        }
        prop_assert_eq!(outcome.conflicts.len(), conflicted.len());
    }

    #[test]
    fn merged_ids_are_unique_and_ordered((local, server) in merge_input_strategy()) {
        let outcome = merge(&local, &server, 0);
        let ids: HashSet<_> = outcome.quotes.iter().map(|q| &q.id).collect();
        prop_assert_eq!(ids.len(), outcome.quotes.len());

        // Local order is preserved as a prefix
        for (merged, ours) in outcome.quotes.iter().zip(&local) {
            prop_assert_eq!(&merged.id, &ours.id);
        }
        prop_assert_eq!(outcome.quotes.len(), local.len() + outcome.new_count);
    }

    #[test]
    fn merge_is_deterministic((local, server) in merge_input_strategy()) {
        prop_assert_eq!(merge(&local, &server, 7), merge(&local, &server, 7));
    }

    #[test]
    fn applying_server_choices_matches_server((local, server) in merge_input_strategy()) {
        let outcome = merge(&local, &server, 0);
        let mut quotes = outcome.quotes.clone();
        for conflict in &outcome.conflicts {
            let snapshot = conflict.snapshot(ConflictChoice::Server);
            if let Some(q) = quotes.iter_mut().find(|q| q.id == conflict.id) {
                *q = snapshot.clone();
            }
        }

        for conflict in &outcome.conflicts {
            let merged = quotes.iter().find(|q| q.id == conflict.id).unwrap();
            prop_assert!(merged.same_content(&conflict.server));
        }
    }
}

#[test]
fn newer_server_edit_wins_with_conflict() {
    let local = quote("1").text("A").author("X").at(100).build();
    let server = quote("1").text("B").author("X").at(200).build();

    let outcome = merge(&[local], &[server.clone()], 0);

    assert_eq!(outcome.conflict_count(), 1);
    assert_eq!(outcome.quotes.len(), 1);
    assert!(outcome.quotes[0].same_content(&server));
    assert_eq!(outcome.quotes[0].timestamp, 200);
}

#[test]
fn newer_local_edit_is_retained_with_conflict() {
    let local = quote("1").text("A").at(200).build();
    let server = quote("1").text("B").at(100).build();

    let outcome = merge(&[local.clone()], &[server], 0);

    assert_eq!(outcome.conflict_count(), 1);
    assert_eq!(outcome.quotes, vec![local]);
}
