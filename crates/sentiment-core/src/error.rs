use thiserror::Error;

/// Failure inside the sentiment classifier collaborator. The batch pass
/// logs and skips the triggering record rather than aborting.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}

/// Transport or parse failure of the price data collaborator.
///
/// An empty history is a normal result, never one of these.
#[derive(Error, Debug)]
pub enum PriceSourceError {
    #[error("price request failed: {0}")]
    Transport(String),

    #[error("price source returned HTTP {0}")]
    Status(u16),

    #[error("invalid price response: {0}")]
    InvalidResponse(String),
}

/// Failure fetching raw posts from a post source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("post source request failed: {0}")]
    Transport(String),

    #[error("post source returned HTTP {0}")]
    Status(u16),

    #[error("invalid post listing: {0}")]
    InvalidResponse(String),
}
