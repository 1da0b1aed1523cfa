//! Post source over the public Reddit JSON listing API.
//!
//! Reads `/r/{subreddit}/new.json` for each configured subreddit, newest
//! first. Reddit requires a descriptive user agent on this endpoint;
//! anonymous defaults get throttled hard.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use sentiment_core::{PostSource, RawPost, SourceError};
use serde::Deserialize;

const BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: ChildData,
}

#[derive(Debug, Deserialize)]
struct ChildData {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: String,
    created_utc: f64,
    score: i64,
}

#[derive(Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    subreddits: Vec<String>,
}

impl RedditClient {
    pub fn new(subreddits: Vec<String>, user_agent: &str) -> Self {
        Self::with_base_url(subreddits, user_agent, BASE_URL.to_string())
    }

    pub fn with_base_url(subreddits: Vec<String>, user_agent: &str, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url,
            subreddits,
        }
    }

    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        limit: usize,
    ) -> Result<Vec<RawPost>, SourceError> {
        let url = format!("{}/r/{}/new.json", self.base_url, subreddit);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        let posts = listing
            .data
            .children
            .into_iter()
            .filter_map(|child| {
                let d = child.data;
                let created_at = DateTime::from_timestamp(d.created_utc as i64, 0)?;
                Some(RawPost {
                    id: d.id,
                    title: d.title,
                    body: d.selftext,
                    author: d.author,
                    created_at,
                    score: d.score,
                })
            })
            .collect();

        Ok(posts)
    }
}

#[async_trait]
impl PostSource for RedditClient {
    /// Fetch up to `limit` newest posts from each configured subreddit.
    async fn fetch_new(&self, limit: usize) -> Result<Vec<RawPost>, SourceError> {
        let mut all = Vec::new();
        for subreddit in &self.subreddits {
            let posts = self.fetch_subreddit(subreddit, limit).await?;
            tracing::debug!(subreddit, count = posts.len(), "fetched listing page");
            all.extend(posts);
        }
        Ok(all)
    }
}
