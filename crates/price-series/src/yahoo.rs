//! Daily OHLC history from the Yahoo Finance chart endpoint.
//!
//! Epoch timestamps in the response are normalized to naive UTC calendar
//! dates. An unknown symbol or an empty range yields an empty bar list;
//! only transport and parse failures surface as [`PriceSourceError`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use sentiment_core::{PriceBar, PriceDataSource, PriceSourceError};
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Clone)]
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

impl YahooChartClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("stockpulse/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, base_url }
    }

    fn field_at(field: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
        field.as_ref().and_then(|v| v.get(idx).copied().flatten())
    }
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceDataSource for YahooChartClient {
    async fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceSourceError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // End of the `end` day so the range is inclusive.
        let period2 = (end + chrono::Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PriceSourceError::Transport(e.to_string()))?;

        // Yahoo answers 404 for unknown symbols; that is "no data", not a
        // failure of the source.
        if response.status().as_u16() == 404 {
            tracing::warn!(symbol, "price source knows no such symbol");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(PriceSourceError::Status(response.status().as_u16()));
        }

        let parsed: ChartResponse = response
            .json()
            .await
            .map_err(|e| PriceSourceError::InvalidResponse(e.to_string()))?;

        let Some(result) = parsed.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }) else {
            return Ok(Vec::new());
        };

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
                continue;
            };
            // Holidays and halted sessions show up as null rows; skip them.
            let Some(close) = Self::field_at(&quote.close, i) else {
                continue;
            };
            bars.push(PriceBar {
                date,
                open: Self::field_at(&quote.open, i).unwrap_or(close),
                high: Self::field_at(&quote.high, i).unwrap_or(close),
                low: Self::field_at(&quote.low, i).unwrap_or(close),
                close,
                volume: Self::field_at(&quote.volume, i).unwrap_or(0.0),
            });
        }

        tracing::debug!(symbol, bars = bars.len(), "fetched price history");
        Ok(bars)
    }
}
