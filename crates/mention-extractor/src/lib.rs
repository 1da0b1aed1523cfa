//! Ticker mention extraction: given free text and the instrument catalog,
//! return the set of symbols the text refers to.
//!
//! Two independent passes, unioned:
//!
//! 1. Symbol pass — maximal runs of 1-5 uppercase letters at word
//!    boundaries that are members of the catalog universe. Bare words that
//!    happen to be valid tickers ("ON", "ALL") do match; that ambiguity is
//!    inherent to the heuristic and is mitigated upstream via the catalog's
//!    stop-word exclusion set, not here.
//! 2. Name pass — lower-cased whitespace tokens looked up in the
//!    company-name index. No stemming, no multi-word names.

use std::collections::BTreeSet;

use ticker_catalog::TickerCatalog;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Extract all instrument mentions from `text`. Pure and deterministic;
/// returns the empty set when nothing matches.
pub fn extract(text: &str, catalog: &TickerCatalog) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    // Symbol pass: scan for maximal uppercase runs bounded by non-word chars.
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_uppercase() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_ascii_uppercase() {
            i += 1;
        }
        let len = i - start;

        let bounded_left = start == 0 || !is_word_char(chars[start - 1]);
        let bounded_right = i == chars.len() || !is_word_char(chars[i]);

        if (1..=5).contains(&len) && bounded_left && bounded_right {
            let run: String = chars[start..i].iter().collect();
            if catalog.contains_symbol(&run) {
                found.insert(run);
            }
        }
    }

    // Name pass: word-by-word lookup against the normalized name index.
    for token in text.to_lowercase().split_whitespace() {
        if let Some(symbol) = catalog.lookup_name(token) {
            found.insert(symbol.to_string());
        }
    }

    found
}
