//! Instrument catalog: the universe of valid ticker symbols plus a
//! normalized company-name lookup, loaded once per run from an exchange
//! listing CSV (e.g. the NASDAQ symbol directory).

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("cannot read catalog source: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog CSV is missing a symbol column (expected 'Symbol' or 'ACT Symbol')")]
    MissingSymbolColumn,
}

/// Immutable reference data for mention extraction.
///
/// Built once at startup and passed by reference wherever extraction
/// happens; there is no ambient global copy.
#[derive(Debug, Clone)]
pub struct TickerCatalog {
    symbols: HashSet<String>,
    name_index: HashMap<String, String>,
}

impl TickerCatalog {
    /// Load from a CSV file with `Symbol` (or `ACT Symbol`) and
    /// `Security Name` columns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::load_with_stop_words(path, &HashSet::new())
    }

    /// Load with an exclusion set applied to the symbol universe.
    ///
    /// Short tickers that are also common English words ("ON", "ALL", "IT")
    /// make the symbol pass of extraction noisy; callers wanting precision
    /// supply them here and they are dropped from the universe entirely.
    pub fn load_with_stop_words(
        path: impl AsRef<Path>,
        stop_words: &HashSet<String>,
    ) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, stop_words)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        stop_words: &HashSet<String>,
    ) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let symbol_col = headers
            .iter()
            .position(|h| h == "Symbol")
            .or_else(|| headers.iter().position(|h| h == "ACT Symbol"))
            .ok_or(CatalogError::MissingSymbolColumn)?;
        let name_col = headers.iter().position(|h| h == "Security Name");

        let mut symbols = HashSet::new();
        let mut name_index = HashMap::new();

        for record in csv_reader.records() {
            let record = record?;
            let Some(symbol) = record.get(symbol_col) else {
                continue;
            };

            // Reject test issues, units, warrants etc. which carry digits
            // or suffix markers like "$" and "." in their symbols.
            if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            if stop_words.contains(symbol) {
                continue;
            }
            symbols.insert(symbol.to_string());

            // "Apple Inc. - Common Stock" -> "apple"
            if let Some(name) = name_col.and_then(|i| record.get(i)) {
                if let Some(first) = name.split_whitespace().next() {
                    let clean: String =
                        first.chars().filter(|c| *c != '.' && *c != ',').collect();
                    if !clean.is_empty() {
                        // Last row wins on collisions ("First Bank", "First Solar", ...)
                        name_index.insert(clean.to_lowercase(), symbol.to_string());
                    }
                }
            }
        }

        tracing::info!(
            symbols = symbols.len(),
            names = name_index.len(),
            "loaded ticker catalog"
        );

        Ok(Self {
            symbols,
            name_index,
        })
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Look up a lower-cased company-name token, returning its ticker.
    pub fn lookup_name(&self, token: &str) -> Option<&str> {
        self.name_index.get(token).map(String::as_str)
    }

    pub fn symbols(&self) -> &HashSet<String> {
        &self.symbols
    }

    pub fn name_index(&self) -> &HashMap<String, String> {
        &self.name_index
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Symbol,Security Name
AAPL,Apple Inc. - Common Stock
TSLA,\"Tesla, Inc. - Common Stock\"
AAPL$W,Apple Warrant Test Issue
BRK1,Bogus Unit With Digit
ON,ON Semiconductor Corporation
F,Ford Motor Company
";

    fn sample_catalog() -> TickerCatalog {
        TickerCatalog::from_reader(SAMPLE_CSV.as_bytes(), &HashSet::new()).unwrap()
    }

    #[test]
    fn test_loads_alphabetic_symbols_only() {
        let catalog = sample_catalog();
        assert!(catalog.contains_symbol("AAPL"));
        assert!(catalog.contains_symbol("TSLA"));
        assert!(catalog.contains_symbol("F"));
        assert!(!catalog.contains_symbol("AAPL$W"));
        assert!(!catalog.contains_symbol("BRK1"));
    }

    #[test]
    fn test_name_index_normalization() {
        let catalog = sample_catalog();
        // "Apple Inc." -> key "apple"; "Tesla, Inc." -> key "tesla"
        assert_eq!(catalog.lookup_name("apple"), Some("AAPL"));
        assert_eq!(catalog.lookup_name("tesla"), Some("TSLA"));
        assert_eq!(catalog.lookup_name("ford"), Some("F"));
        assert_eq!(catalog.lookup_name("Apple"), None);
    }

    #[test]
    fn test_name_index_values_are_valid_symbols() {
        let catalog = sample_catalog();
        for symbol in catalog.name_index().values() {
            assert!(catalog.contains_symbol(symbol), "{symbol} not in universe");
        }
    }

    #[test]
    fn test_last_row_wins_on_name_collision() {
        let csv = "\
Symbol,Security Name
FBP,First BanCorp
FSLR,First Solar Inc.
";
        let catalog = TickerCatalog::from_reader(csv.as_bytes(), &HashSet::new()).unwrap();
        assert_eq!(catalog.lookup_name("first"), Some("FSLR"));
    }

    #[test]
    fn test_stop_words_drop_symbols() {
        let stop: HashSet<String> = ["ON".to_string()].into_iter().collect();
        let catalog = TickerCatalog::from_reader(SAMPLE_CSV.as_bytes(), &stop).unwrap();
        assert!(!catalog.contains_symbol("ON"));
        assert!(catalog.contains_symbol("AAPL"));
    }

    #[test]
    fn test_missing_symbol_column_is_an_error() {
        let csv = "Ticker,Name\nAAPL,Apple\n";
        let err = TickerCatalog::from_reader(csv.as_bytes(), &HashSet::new());
        assert!(matches!(err, Err(CatalogError::MissingSymbolColumn)));
    }

    #[test]
    fn test_act_symbol_column_accepted() {
        let csv = "ACT Symbol,Security Name\nGM,General Motors Company\n";
        let catalog = TickerCatalog::from_reader(csv.as_bytes(), &HashSet::new()).unwrap();
        assert!(catalog.contains_symbol("GM"));
        assert_eq!(catalog.lookup_name("general"), Some("GM"));
    }
}
