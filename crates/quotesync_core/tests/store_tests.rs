//! Integration tests for the quote store over real backends.

use proptest::prelude::*;
use quotesync_core::{CategoryFilter, ManualClock, QuoteId, QuoteSource, QuoteStore, StoreConfig};
use quotesync_storage::{FileBackend, InMemoryBackend, KeyValueBackend};
use std::sync::Arc;
use tempfile::tempdir;

fn open(backend: InMemoryBackend) -> QuoteStore {
    QuoteStore::open_with_clock(
        backend,
        StoreConfig::new().without_seed(),
        Arc::new(ManualClock::new(10_000)),
    )
    .unwrap()
}

#[test]
fn persist_then_reload_is_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store");

    let saved = {
        let mut store =
            QuoteStore::open(FileBackend::open(&path).unwrap(), StoreConfig::default()).unwrap();
        store.add("Less is more.", "Mies van der Rohe", "Design").unwrap();
        store.select_category("Design").unwrap();
        store.persist().unwrap();
        store.quotes().to_vec()
    };

    let reloaded =
        QuoteStore::open(FileBackend::open(&path).unwrap(), StoreConfig::default()).unwrap();
    assert_eq!(reloaded.quotes(), saved.as_slice());
    assert_eq!(
        reloaded.active_filter(),
        &CategoryFilter::Category("Design".into())
    );
}

#[test]
fn deleting_last_quote_of_active_category_resets_filter() {
    let backend = InMemoryBackend::new();
    let mut store = open(backend.clone());
    store.add("Keep", "A", "Wisdom").unwrap();
    let lonely = store.add("Go", "B", "Humor").unwrap();

    store.select_category("Humor").unwrap();
    assert!(store.delete(&lonely.id).unwrap());

    assert_eq!(store.active_filter(), &CategoryFilter::All);
    assert_eq!(store.filtered().len(), 1);
    assert_eq!(
        backend.get("lastSelectedCategory").unwrap().as_deref(),
        Some("\"all\"")
    );
}

#[test]
fn stale_persisted_filter_resets_on_load() {
    let backend = InMemoryBackend::with_entries([
        (
            "quotes",
            r#"[{"id":"q-1","text":"T","author":"A","category":"Life","timestamp":1}]"#,
        ),
        ("lastSelectedCategory", "\"Vanished\""),
    ]);

    let store = open(backend.clone());
    assert_eq!(store.active_filter(), &CategoryFilter::All);
    assert_eq!(
        backend.get("lastSelectedCategory").unwrap().as_deref(),
        Some("\"all\"")
    );
}

#[test]
fn bare_string_filter_is_accepted() {
    let backend = InMemoryBackend::with_entries([
        (
            "quotes",
            r#"[{"id":"q-1","text":"T","author":"A","category":"Life","timestamp":1}]"#,
        ),
        ("lastSelectedCategory", "Life"),
    ]);

    let store = open(backend);
    assert_eq!(store.active_filter(), &CategoryFilter::Category("Life".into()));
}

#[test]
fn legacy_records_are_upgraded_and_persisted() {
    let backend = InMemoryBackend::with_entries([(
        "quotes",
        r#"[
            {"text":"Old one","author":"A","category":"Life"},
            {"text":"","author":"Nobody","category":"Life"},
            {"text":"No category","author":"B"}
        ]"#,
    )]);

    let store = open(backend.clone());
    assert_eq!(store.len(), 2);
    for quote in store.quotes() {
        assert_eq!(quote.timestamp, 10_000);
        assert_eq!(quote.source, QuoteSource::Local);
    }
    assert_eq!(store.quotes()[1].category, "General");

    // Upgraded ids are stable across reloads
    let again = open(backend);
    assert_eq!(again.quotes(), store.quotes());
}

#[test]
fn duplicate_persisted_ids_keep_first() {
    let backend = InMemoryBackend::with_entries([(
        "quotes",
        r#"[
            {"id":"q-1","text":"First","author":"A","category":"C","timestamp":1},
            {"id":"q-1","text":"Second","author":"A","category":"C","timestamp":2}
        ]"#,
    )]);

    let store = open(backend);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&QuoteId::new("q-1")).unwrap().text, "First");
}

#[test]
fn corrupted_quote_list_fails_to_open() {
    let backend = InMemoryBackend::with_entries([("quotes", "{oops")]);
    let result = QuoteStore::open(backend, StoreConfig::default());
    assert!(result.is_err());
}

#[test]
fn category_index_tracks_mutations() {
    let mut store = open(InMemoryBackend::new());
    let a = store.add("T", "A", "Zen").unwrap();
    store.add("T", "A", "Art").unwrap();
    assert_eq!(store.categories().options(), vec!["all", "Art", "Zen"]);

    store.update(&a.id, "T", "A", "Art").unwrap();
    assert_eq!(store.categories().options(), vec!["all", "Art"]);
}

proptest! {
    #[test]
    fn reload_after_any_edit_sequence_is_identical(
        edits in prop::collection::vec(("[a-z ]{0,8}", "[A-Z][a-z]{0,5}", "[A-C]?", any::<bool>()), 0..12)
    ) {
        let backend = InMemoryBackend::new();
        let mut store = open(backend.clone());

        for (text, author, category, delete_first) in edits {
            if delete_first {
                if let Some(id) = store.quotes().first().map(|q| q.id.clone()) {
                    store.delete(&id).unwrap();
                }
            }
            // Empty text is rejected and must leave no trace
            let _ = store.add(&text, &author, &category);
        }

        let reloaded = open(backend);
        prop_assert_eq!(reloaded.quotes(), store.quotes());
        prop_assert_eq!(reloaded.active_filter(), store.active_filter());
        for quote in store.quotes() {
            prop_assert!(!quote.text.is_empty());
            prop_assert!(!quote.author.is_empty());
        }
    }
}
