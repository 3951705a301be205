//! Property-based test generators using proptest.
//!
//! Ids and content come from small pools so that generated local and server
//! lists overlap and sometimes agree, which is where merges get interesting.

use proptest::prelude::*;
use quotesync_core::{Quote, QuoteId, QuoteSource};
use std::collections::BTreeMap;

/// Strategy for ids drawn from a pool of twelve.
pub fn quote_id_strategy() -> impl Strategy<Value = QuoteId> {
    (0u8..12).prop_map(|n| QuoteId::new(format!("q-{n}")))
}

/// Strategy for non-empty quote text from a small vocabulary.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Be kind.", "Ship it.", "Know thyself.", "Less is more."])
        .prop_map(str::to_string)
}

/// Strategy for authors.
pub fn author_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Ada", "Grace", "Linus"]).prop_map(str::to_string)
}

/// Strategy for categories, including case variants.
pub fn category_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Wisdom", "wisdom", "Humor", "Programming"])
        .prop_map(str::to_string)
}

/// Strategy for sources.
pub fn source_strategy() -> impl Strategy<Value = QuoteSource> {
    prop_oneof![
        Just(QuoteSource::Local),
        Just(QuoteSource::Server),
        Just(QuoteSource::Synced),
    ]
}

/// Strategy for a quote with the given id.
pub fn quote_with_id(id: QuoteId) -> impl Strategy<Value = Quote> {
    (
        text_strategy(),
        author_strategy(),
        category_strategy(),
        0i64..1_000,
        source_strategy(),
    )
        .prop_map(move |(text, author, category, timestamp, source)| {
            Quote::new(id.clone(), text, author, category, timestamp).with_source(source)
        })
}

/// Strategy for a single quote.
pub fn quote_strategy() -> impl Strategy<Value = Quote> {
    quote_id_strategy().prop_flat_map(quote_with_id)
}

/// Strategy for a list of quotes with unique ids, up to `max` long.
pub fn quote_list_strategy(max: usize) -> impl Strategy<Value = Vec<Quote>> {
    prop::collection::btree_map(quote_id_strategy(), quote_strategy(), 0..=max).prop_map(
        |entries: BTreeMap<QuoteId, Quote>| {
            entries
                .into_iter()
                .map(|(id, quote)| Quote { id, ..quote })
                .collect()
        },
    )
}

/// Strategy for a `(local, server)` pair of overlapping quote lists.
pub fn merge_input_strategy() -> impl Strategy<Value = (Vec<Quote>, Vec<Quote>)> {
    (quote_list_strategy(8), quote_list_strategy(8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn lists_have_unique_ids(quotes in quote_list_strategy(10)) {
            let ids: HashSet<_> = quotes.iter().map(|q| q.id.clone()).collect();
            prop_assert_eq!(ids.len(), quotes.len());
        }

        #[test]
        fn quotes_have_content(quote in quote_strategy()) {
            prop_assert!(!quote.text.is_empty());
            prop_assert!(!quote.author.is_empty());
        }
    }
}
