//! Sentiment/price correlation engine.
//!
//! Joins a daily sentiment series with a derived daily price series, then
//! computes descriptive correlation and directional-accuracy metrics,
//! including one-day-lagged variants ("does yesterday's mood predict
//! today's move"). Metrics are descriptive only; nothing here tests for
//! statistical significance.

use std::collections::BTreeMap;

use sentiment_core::stats::pearson;
use sentiment_core::{DailyPoint, PriceDay};

pub mod models;
pub use models::{AccuracyMetrics, CombinedRow, CorrelationMetrics};

/// Percent-change magnitude below which a day counts as flat.
pub const DEFAULT_DIRECTION_THRESHOLD: f64 = 0.02;

/// Inner-join sentiment and price series on date.
///
/// A date present on only one side is dropped. The derived movement
/// fields ride along unchanged, so only the first retained price day may
/// carry `None` there. Output is sorted ascending by date.
pub fn combine(sentiment: &[DailyPoint], price: &[PriceDay]) -> Vec<CombinedRow> {
    let by_date: BTreeMap<_, _> = sentiment.iter().map(|p| (p.date, p.value)).collect();

    let mut rows: Vec<CombinedRow> = price
        .iter()
        .filter_map(|day| {
            by_date.get(&day.date).map(|&sentiment| CombinedRow {
                date: day.date,
                sentiment,
                close: day.close,
                daily_return: day.daily_return,
                percent_change: day.percent_change,
            })
        })
        .collect();
    rows.sort_by_key(|r| r.date);
    rows
}

/// Pearson correlations over the combined series.
///
/// Returns `None` for fewer than 2 rows — the explicit "insufficient
/// data" marker callers must check before reading any metric. Movement
/// correlations use only the rows where the derived field exists
/// (pairwise-complete, as the first price day has none).
pub fn correlate(combined: &[CombinedRow]) -> Option<CorrelationMetrics> {
    if combined.len() < 2 {
        return None;
    }

    let sentiment: Vec<f64> = combined.iter().map(|r| r.sentiment).collect();
    let close: Vec<f64> = combined.iter().map(|r| r.close).collect();

    let (ret_sent, ret): (Vec<f64>, Vec<f64>) = combined
        .iter()
        .filter_map(|r| r.daily_return.map(|v| (r.sentiment, v)))
        .unzip();
    let (pct_sent, pct): (Vec<f64>, Vec<f64>) = combined
        .iter()
        .filter_map(|r| r.percent_change.map(|v| (r.sentiment, v)))
        .unzip();

    // Lagged pairing: sentiment at t-1 against movement at t. The first
    // row has no predecessor and is dropped from the pairing.
    let (lag_sent_ret, lag_ret): (Vec<f64>, Vec<f64>) = combined
        .windows(2)
        .filter_map(|w| w[1].daily_return.map(|v| (w[0].sentiment, v)))
        .unzip();
    let (lag_sent_pct, lag_pct): (Vec<f64>, Vec<f64>) = combined
        .windows(2)
        .filter_map(|w| w[1].percent_change.map(|v| (w[0].sentiment, v)))
        .unzip();

    let sentiment_price_corr = pearson(&sentiment, &close);
    let sentiment_return_corr = pearson(&ret_sent, &ret);

    Some(CorrelationMetrics {
        sentiment_price_corr,
        sentiment_return_corr,
        sentiment_change_corr: pearson(&pct_sent, &pct),
        sentiment_lagged_return_corr: pearson(&lag_sent_ret, &lag_ret),
        sentiment_lagged_change_corr: pearson(&lag_sent_pct, &lag_pct),
        sentiment_price_r2: sentiment_price_corr.powi(2),
        sentiment_return_r2: sentiment_return_corr.powi(2),
    })
}

/// Directional prediction accuracy of lagged sentiment.
///
/// For each row with a predecessor and a percent-change value, the actual
/// direction is +1/0/-1 by thresholding `percent_change` against
/// ±`threshold`, and the predicted direction comes from the previous
/// day's sentiment score: above 0.5 predicts up, otherwise down. A score
/// of exactly 0.5 therefore predicts down — the strict comparison is
/// deliberate, preserved behavior, not a tie-break rule to "fix".
///
/// Returns `None` when no row yields a usable prediction.
pub fn prediction_accuracy(combined: &[CombinedRow], threshold: f64) -> Option<AccuracyMetrics> {
    let mut total = 0usize;
    let mut correct = 0usize;
    let mut predicted_positive = 0usize;
    let mut actual_positive = 0usize;
    let mut true_positive = 0usize;

    for window in combined.windows(2) {
        let prev_sentiment = window[0].sentiment;
        let Some(pct) = window[1].percent_change else {
            continue;
        };

        let price_direction: i8 = if pct > threshold {
            1
        } else if pct < -threshold {
            -1
        } else {
            0
        };
        let sentiment_direction: i8 = if prev_sentiment > 0.5 { 1 } else { -1 };

        total += 1;
        if sentiment_direction == price_direction {
            correct += 1;
        }
        if sentiment_direction == 1 {
            predicted_positive += 1;
        }
        if price_direction == 1 {
            actual_positive += 1;
            if sentiment_direction == 1 {
                true_positive += 1;
            }
        }
    }

    if total == 0 {
        return None;
    }

    Some(AccuracyMetrics {
        accuracy: correct as f64 / total as f64,
        precision: if predicted_positive > 0 {
            true_positive as f64 / predicted_positive as f64
        } else {
            0.0
        },
        recall: if actual_positive > 0 {
            true_positive as f64 / actual_positive as f64
        } else {
            0.0
        },
        total_predictions: total,
        correct_predictions: correct,
    })
}
