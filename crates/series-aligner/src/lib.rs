//! Daily resampling of irregular timestamped observations.
//!
//! Sentiment observations arrive at post granularity (many per day, none on
//! quiet days). Correlation against daily price bars needs one value per
//! calendar day, so this crate buckets observations by UTC day, averages
//! within each day, and linearly interpolates across days with no
//! observations. No extrapolation happens past the observed range.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sentiment_core::DailyPoint;

/// Resample `(timestamp, value)` observations into a gap-free daily series.
///
/// Input need not be sorted or deduplicated. Output dates are strictly
/// ascending and contiguous from the earliest to the latest observed day.
pub fn resample_daily(observations: &[(DateTime<Utc>, f64)]) -> Vec<DailyPoint> {
    // Bucket by UTC calendar day, averaging within each day.
    let mut buckets: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for (ts, value) in observations {
        let entry = buckets.entry(ts.date_naive()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let daily: Vec<DailyPoint> = buckets
        .into_iter()
        .map(|(date, (sum, count))| DailyPoint {
            date,
            value: sum / count as f64,
        })
        .collect();

    if daily.len() < 2 {
        return daily;
    }

    // Fill interior gaps by linear interpolation between observed neighbors.
    // The range endpoints are always observed days, so the result spans
    // min..=max with no holes.
    let mut series = Vec::new();
    for window in daily.windows(2) {
        let (left, right) = (window[0], window[1]);
        series.push(left);

        let span = (right.date - left.date).num_days();
        for offset in 1..span {
            let t = offset as f64 / span as f64;
            series.push(DailyPoint {
                date: left.date + Duration::days(offset),
                value: left.value + t * (right.value - left.value),
            });
        }
    }
    series.push(*daily.last().expect("len >= 2 checked above"));

    series
}
