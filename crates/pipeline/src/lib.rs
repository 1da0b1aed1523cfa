//! Batch pipeline stages: ingest posts, classify pending sentiment, prune
//! old records, and analyze sentiment/price correlation for a symbol.
//!
//! Each stage is generic over the collaborator capabilities
//! ([`PostSource`], [`SentimentClassifier`], [`PriceDataSource`]) so the
//! whole cycle runs against mocks in tests.

use anyhow::Result;
use chrono::{Duration, Utc};
use correlation_engine::{AccuracyMetrics, CorrelationMetrics, DEFAULT_DIRECTION_THRESHOLD};
use post_store::PostStore;
use price_series::PriceSeriesAdapter;
use sentiment_core::{Post, PostSource, PriceDataSource, SentimentClassifier};
use serde::Serialize;
use ticker_catalog::TickerCatalog;

#[derive(Debug, Default, Serialize)]
pub struct IngestSummary {
    pub fetched: usize,
    pub with_tickers: usize,
    pub inserted: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct ClassifySummary {
    pub pending: usize,
    pub classified: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub posts: usize,
    pub combined_days: usize,
    pub correlations: Option<CorrelationMetrics>,
    pub accuracy: Option<AccuracyMetrics>,
}

/// Fetch the newest posts, tag each with its ticker mentions, and store
/// the ones that mention anything. Posts with no mentions are discarded
/// before persistence; duplicate ids are ignored by the store.
pub async fn ingest<S: PostSource>(
    source: &S,
    catalog: &TickerCatalog,
    store: &PostStore,
    limit: usize,
) -> Result<IngestSummary> {
    let raw_posts = source.fetch_new(limit).await?;
    let mut summary = IngestSummary {
        fetched: raw_posts.len(),
        ..Default::default()
    };

    for raw in raw_posts {
        let text = format!("{} {}", raw.title, raw.body);
        let tickers = mention_extractor::extract(&text, catalog);
        if tickers.is_empty() {
            continue;
        }
        summary.with_tickers += 1;

        let post = Post::from_raw(raw, tickers);
        if store.upsert_ignore(&post).await? {
            summary.inserted += 1;
            tracing::debug!(id = %post.id, tickers = ?post.tickers, "stored new post");
        }
    }

    tracing::info!(
        fetched = summary.fetched,
        inserted = summary.inserted,
        "ingest pass complete"
    );
    Ok(summary)
}

/// Run the classifier over every post the sentiment pass has not seen.
/// A classifier failure skips the offending post and continues; already
/// populated sentiment is never rewritten.
pub async fn classify_pending<C: SentimentClassifier>(
    classifier: &C,
    store: &PostStore,
) -> Result<ClassifySummary> {
    let pending = store.find_missing_sentiment().await?;
    let mut summary = ClassifySummary {
        pending: pending.len(),
        ..Default::default()
    };

    for post in pending {
        match classifier.classify(&post.full_text()).await {
            Ok(sentiment) => {
                store
                    .update_sentiment(&post.id, sentiment.label, sentiment.score)
                    .await?;
                summary.classified += 1;
            }
            Err(e) => {
                tracing::warn!(id = %post.id, error = %e, "classification failed, skipping post");
                summary.skipped += 1;
            }
        }
    }

    tracing::info!(
        classified = summary.classified,
        skipped = summary.skipped,
        "sentiment pass complete"
    );
    Ok(summary)
}

/// Correlate daily sentiment against price movement for one symbol over
/// the trailing `days_back` window. `None` metrics mean insufficient
/// data, not an error.
pub async fn analyze<P: PriceDataSource>(
    store: &PostStore,
    prices: &PriceSeriesAdapter<P>,
    symbol: &str,
    days_back: i64,
) -> Result<AnalysisReport> {
    let since = Utc::now() - Duration::days(days_back);
    let posts = store.query_by_symbol_and_time(symbol, since).await?;

    let observations: Vec<_> = posts
        .iter()
        .filter_map(|p| p.sentiment.map(|s| (p.created_at, s.score)))
        .collect();
    let sentiment_series = series_aligner::resample_daily(&observations);

    let price_series = prices
        .fetch_and_derive(symbol, since.date_naive(), Utc::now().date_naive())
        .await?;

    let combined = correlation_engine::combine(&sentiment_series, &price_series);
    let correlations = correlation_engine::correlate(&combined);
    let accuracy =
        correlation_engine::prediction_accuracy(&combined, DEFAULT_DIRECTION_THRESHOLD);

    Ok(AnalysisReport {
        symbol: symbol.to_string(),
        posts: posts.len(),
        combined_days: combined.len(),
        correlations,
        accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use sentiment_core::{
        ClassificationError, PriceBar, PriceSourceError, RawPost, Sentiment, SentimentLabel,
        SourceError,
    };
    use std::collections::HashSet;

    const SAMPLE_CSV: &str = "\
Symbol,Security Name
AAPL,Apple Inc. - Common Stock
TSLA,\"Tesla, Inc. - Common Stock\"
";

    struct FixedSource {
        posts: Vec<RawPost>,
    }

    #[async_trait]
    impl PostSource for FixedSource {
        async fn fetch_new(&self, _limit: usize) -> Result<Vec<RawPost>, SourceError> {
            Ok(self.posts.clone())
        }
    }

    /// Positive for text containing "moon", fails on "broken", else negative.
    struct KeywordClassifier;

    #[async_trait]
    impl SentimentClassifier for KeywordClassifier {
        async fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError> {
            if text.contains("broken") {
                return Err(ClassificationError::ServiceUnavailable("down".into()));
            }
            Ok(if text.contains("moon") {
                Sentiment {
                    label: SentimentLabel::Positive,
                    score: 0.9,
                }
            } else {
                Sentiment {
                    label: SentimentLabel::Negative,
                    score: 0.2,
                }
            })
        }
    }

    struct EmptyPrices;

    #[async_trait]
    impl PriceDataSource for EmptyPrices {
        async fn history(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, PriceSourceError> {
            Ok(Vec::new())
        }
    }

    fn raw(id: &str, title: &str, hours_ago: i64) -> RawPost {
        RawPost {
            id: id.to_string(),
            title: title.to_string(),
            body: String::new(),
            author: "tester".to_string(),
            created_at: Utc::now() - Duration::hours(hours_ago),
            score: 1,
        }
    }

    async fn store() -> PostStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = PostStore::new(pool);
        store.init().await.unwrap();
        store
    }

    fn catalog() -> TickerCatalog {
        TickerCatalog::from_reader(SAMPLE_CSV.as_bytes(), &HashSet::new()).unwrap()
    }

    #[tokio::test]
    async fn test_ingest_discards_mentionless_posts() {
        let source = FixedSource {
            posts: vec![
                raw("a", "TSLA to the moon", 1),
                raw("b", "what should I cook tonight", 2),
                raw("c", "apple earnings preview", 3),
            ],
        };
        let store = store().await;

        let summary = ingest(&source, &catalog(), &store, 100).await.unwrap();
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.with_tickers, 2);
        assert_eq!(summary.inserted, 2);

        // Re-running the same batch inserts nothing new.
        let again = ingest(&source, &catalog(), &store, 100).await.unwrap();
        assert_eq!(again.inserted, 0);
    }

    #[tokio::test]
    async fn test_classify_skips_failures_and_continues() {
        let source = FixedSource {
            posts: vec![
                raw("a", "TSLA to the moon", 1),
                raw("b", "TSLA broken guidance", 2),
                raw("c", "AAPL drifting lower", 3),
            ],
        };
        let store = store().await;
        ingest(&source, &catalog(), &store, 100).await.unwrap();

        let summary = classify_pending(&KeywordClassifier, &store).await.unwrap();
        assert_eq!(summary.pending, 3);
        assert_eq!(summary.classified, 2);
        assert_eq!(summary.skipped, 1);

        // The skipped post stays pending for the next cycle.
        let second = classify_pending(&KeywordClassifier, &store).await.unwrap();
        assert_eq!(second.pending, 1);
    }

    #[tokio::test]
    async fn test_analyze_with_empty_price_history_reports_insufficient() {
        let source = FixedSource {
            posts: vec![raw("a", "TSLA to the moon", 1), raw("b", "TSLA dip", 30)],
        };
        let store = store().await;
        ingest(&source, &catalog(), &store, 100).await.unwrap();
        classify_pending(&KeywordClassifier, &store).await.unwrap();

        let adapter = PriceSeriesAdapter::new(EmptyPrices);
        let report = analyze(&store, &adapter, "TSLA", 30).await.unwrap();

        assert_eq!(report.combined_days, 0);
        assert!(report.correlations.is_none());
        assert!(report.accuracy.is_none());
    }

    #[tokio::test]
    async fn test_analyze_end_to_end_with_scripted_prices() {
        struct TwoDayPrices {
            day1: NaiveDate,
        }

        #[async_trait]
        impl PriceDataSource for TwoDayPrices {
            async fn history(
                &self,
                _symbol: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<PriceBar>, PriceSourceError> {
                let bar = |date, close| PriceBar {
                    date,
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 0.0,
                };
                Ok(vec![
                    bar(self.day1, 100.0),
                    bar(self.day1 + Duration::days(1), 95.0),
                ])
            }
        }

        // Bullish chatter yesterday, bearish today; price dropped 5% today.
        let now = Utc::now();
        let yesterday = now - Duration::days(1);
        let source = FixedSource {
            posts: vec![
                raw_at("a", "TSLA to the moon", yesterday),
                raw_at("b", "TSLA falling knife", now),
            ],
        };
        let store = store().await;
        ingest(&source, &catalog(), &store, 100).await.unwrap();
        classify_pending(&KeywordClassifier, &store).await.unwrap();

        let adapter = PriceSeriesAdapter::new(TwoDayPrices {
            day1: yesterday.date_naive(),
        });
        let report = analyze(&store, &adapter, "TSLA", 30).await.unwrap();

        assert_eq!(report.combined_days, 2);
        // Yesterday's 0.9 sentiment predicted up; the -5% day says down.
        let accuracy = report.accuracy.unwrap();
        assert_eq!(accuracy.total_predictions, 1);
        assert_eq!(accuracy.accuracy, 0.0);
    }

    fn raw_at(id: &str, title: &str, at: DateTime<Utc>) -> RawPost {
        RawPost {
            id: id.to_string(),
            title: title.to_string(),
            body: String::new(),
            author: "tester".to_string(),
            created_at: at,
            score: 1,
        }
    }
}
