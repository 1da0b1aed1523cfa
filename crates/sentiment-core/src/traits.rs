use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{ClassificationError, PriceBar, PriceSourceError, RawPost, Sentiment, SourceError};

/// Sentiment classification capability: free text in, (label, confidence) out.
/// Implementations may be remote (FinBERT service), cached, or mock.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError>;
}

/// Historical daily price bars for a symbol over an inclusive date range.
/// An empty vec means "no data", which callers must treat as insufficient
/// data rather than a failure.
#[async_trait]
pub trait PriceDataSource: Send + Sync {
    async fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceSourceError>;
}

/// Source of raw posts, newest first, bounded by a caller-supplied limit.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_new(&self, limit: usize) -> Result<Vec<RawPost>, SourceError>;
}
