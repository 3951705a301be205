//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use quotesync_core::{Quote, QuoteId, QuoteSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CATEGORIES: [&str; 5] = ["Motivation", "Inspiration", "Programming", "Humor", "Wisdom"];

/// Generates `count` quotes with ids `q-0..`, from a fixed seed.
pub fn generate_quotes(count: usize, seed: u64) -> Vec<Quote> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            Quote::new(
                QuoteId::new(format!("q-{i}")),
                format!("Quote number {i}"),
                format!("Author {}", rng.gen_range(0..50)),
                CATEGORIES[rng.gen_range(0..CATEGORIES.len())],
                rng.gen_range(0..1_000_000),
            )
        })
        .collect()
}

/// Derives a server list from `local`.
///
/// About `overlap` of the local ids are kept, a tenth of those with edited
/// text, and `extra` new server-only quotes are appended.
pub fn server_view(local: &[Quote], overlap: f64, extra: usize, seed: u64) -> Vec<Quote> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut server: Vec<Quote> = local
        .iter()
        .filter_map(|q| {
            if !rng.gen_bool(overlap) {
                return None;
            }
            let mut copy = q.clone().with_source(QuoteSource::Server);
            copy.timestamp += rng.gen_range(-500..500);
            if rng.gen_bool(0.1) {
                copy.text.push_str(" (edited)");
            }
            Some(copy)
        })
        .collect();

    server.extend((0..extra).map(|i| {
        Quote::new(
            QuoteId::new(format!("s-{i}")),
            format!("Server quote {i}"),
            "Server",
            "Remote",
            rng.gen_range(0..1_000_000),
        )
        .with_source(QuoteSource::Server)
    }));
    server
}
