//! Deterministic hashtag-to-category classifier.
//!
//! Maps raw model-produced hashtag text to the fixed six-key
//! [`ClassifiedMetadata`] record. Pure and total: identical input always
//! yields identical output, and no input fails.

use reelindex_core::types::ClassifiedMetadata;
use tracing::debug;

use crate::keywords::{BRANDS, DEMOGRAPHICS, EMOTIONS, LOCATIONS, SECTOR};

/// Classify raw hashtag text into categorical metadata.
///
/// Tokens are taken from whitespace-separated words starting with `#`,
/// lowercased, with the `#` stripped. Each token lands in at most one
/// category, tested in priority order: demographics, sector, emotions,
/// locations, brands. Tokens matching no set are kept in order as
/// unclassified; the first unclassified token backfills `locations` if it
/// is empty, and the next one backfills `brands` if it is empty. `source`
/// is never populated here.
pub fn classify(text: &str) -> ClassifiedMetadata {
    let normalized = text.replace('\n', " ");

    let mut demographics: Vec<String> = Vec::new();
    let mut sector: Vec<String> = Vec::new();
    let mut emotions: Vec<String> = Vec::new();
    let mut locations: Vec<String> = Vec::new();
    let mut brands: Vec<String> = Vec::new();
    let mut unclassified: Vec<String> = Vec::new();

    for word in normalized.split_whitespace() {
        let Some(raw) = word.strip_prefix('#') else {
            continue;
        };
        let token = raw.to_lowercase();
        if token.is_empty() {
            continue;
        }

        // First match wins; the sets are disjoint by construction but the
        // priority order is load-bearing for the fallback below.
        if DEMOGRAPHICS.contains(token.as_str()) {
            demographics.push(token);
        } else if SECTOR.contains(token.as_str()) {
            sector.push(token);
        } else if EMOTIONS.contains(token.as_str()) {
            emotions.push(token);
        } else if LOCATIONS.contains(token.as_str()) {
            locations.push(token);
        } else if BRANDS.contains(token.as_str()) {
            brands.push(token);
        } else {
            unclassified.push(token);
        }
    }

    // Legacy fallback, preserved exactly: the first leftover token stands in
    // for a location, the next for a brand. Order matters.
    let mut leftovers = unclassified.into_iter();
    if locations.is_empty() {
        if let Some(token) = leftovers.next() {
            debug!(token = %token, "Unclassified token backfilled into locations");
            locations.push(token);
        }
    }
    if brands.is_empty() {
        if let Some(token) = leftovers.next() {
            debug!(token = %token, "Unclassified token backfilled into brands");
            brands.push(token);
        }
    }

    ClassifiedMetadata {
        source: String::new(),
        sector: sector.join(", "),
        emotions: emotions.join(", "),
        brands: brands.join(", "),
        locations: locations.join(", "),
        demographics: demographics.join(", "),
    }
}
