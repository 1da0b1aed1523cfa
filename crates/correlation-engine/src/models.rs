use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One date where both a sentiment value and a price close exist.
///
/// `daily_return`/`percent_change` are `None` only on the first day of the
/// underlying price series, which has no predecessor to diff against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub date: NaiveDate,
    pub sentiment: f64,
    pub close: f64,
    pub daily_return: Option<f64>,
    pub percent_change: Option<f64>,
}

/// Pearson correlations between daily sentiment and price movement.
///
/// Produced only when enough data exists; absence of a result is signaled
/// by `Option::None` at the call site, never by zeroed fields, so a
/// genuine zero correlation stays distinguishable from "no data".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMetrics {
    /// corr(sentiment, close)
    pub sentiment_price_corr: f64,
    /// corr(sentiment, daily return)
    pub sentiment_return_corr: f64,
    /// corr(sentiment, percent change)
    pub sentiment_change_corr: f64,
    /// corr(yesterday's sentiment, today's return)
    pub sentiment_lagged_return_corr: f64,
    /// corr(yesterday's sentiment, today's percent change)
    pub sentiment_lagged_change_corr: f64,
    pub sentiment_price_r2: f64,
    pub sentiment_return_r2: f64,
}

/// How well yesterday's sentiment predicted today's price direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub total_predictions: usize,
    pub correct_predictions: usize,
}
