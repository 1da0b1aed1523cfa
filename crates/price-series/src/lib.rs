//! Price series adapter: turns raw daily OHLC history from an external
//! price source into a clean daily close series with derived
//! return/percent-change fields.

use chrono::NaiveDate;
use sentiment_core::{PriceDataSource, PriceDay, PriceSourceError};

pub mod yahoo;
pub use yahoo::YahooChartClient;

/// Wraps any [`PriceDataSource`] and derives daily movement fields.
pub struct PriceSeriesAdapter<S> {
    source: S,
}

impl<S: PriceDataSource> PriceSeriesAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch `[start, end]` history and derive per-day returns.
    ///
    /// An empty history is returned as an empty series; callers treat that
    /// as "insufficient data". Only transport or parse failure of the
    /// source itself is an error.
    pub async fn fetch_and_derive(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceDay>, PriceSourceError> {
        let mut bars = self.source.history(symbol, start, end).await?;
        if bars.is_empty() {
            tracing::warn!(symbol, "no price history for range");
            return Ok(Vec::new());
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        let mut days = Vec::with_capacity(bars.len());
        let mut prev_close: Option<f64> = None;
        for bar in &bars {
            let daily_return = prev_close
                .filter(|prev| *prev != 0.0)
                .map(|prev| (bar.close - prev) / prev);
            days.push(PriceDay {
                date: bar.date,
                close: bar.close,
                daily_return,
                percent_change: daily_return.map(|r| r * 100.0),
            });
            prev_close = Some(bar.close);
        }

        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentiment_core::PriceBar;

    struct FixedSource {
        bars: Vec<PriceBar>,
    }

    #[async_trait]
    impl PriceDataSource for FixedSource {
        async fn history(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, PriceSourceError> {
            Ok(self.bars.clone())
        }
    }

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    #[tokio::test]
    async fn test_empty_history_is_empty_series_not_error() {
        let adapter = PriceSeriesAdapter::new(FixedSource { bars: vec![] });
        let days = adapter
            .fetch_and_derive(
                "TSLA",
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            )
            .await
            .unwrap();
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn test_first_day_has_no_derived_fields() {
        let adapter = PriceSeriesAdapter::new(FixedSource {
            bars: vec![bar(1, 100.0), bar(2, 95.0)],
        });
        let days = adapter
            .fetch_and_derive(
                "TSLA",
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(days.len(), 2);
        assert!(days[0].daily_return.is_none());
        assert!(days[0].percent_change.is_none());

        let ret = days[1].daily_return.unwrap();
        assert!((ret + 0.05).abs() < 1e-12);
        assert!((days[1].percent_change.unwrap() + 5.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unsorted_duplicate_bars_normalized() {
        let adapter = PriceSeriesAdapter::new(FixedSource {
            bars: vec![bar(3, 110.0), bar(1, 100.0), bar(1, 100.0), bar(2, 105.0)],
        });
        let days = adapter
            .fetch_and_derive(
                "AAPL",
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            )
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            ]
        );
        assert!((days[1].daily_return.unwrap() - 0.05).abs() < 1e-12);
    }
}
