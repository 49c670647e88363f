//! Source-specific error types.

use thiserror::Error;

/// Errors a market-data source can return from `fetch`.
///
/// The recorder treats every variant the same way: no batch this tick.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport, authentication or HTTP status failure.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// `fetch` called before a successful `connect`.
    #[error("source not connected")]
    NotConnected,

    /// Response body could not be interpreted.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SourceError::NotConnected.to_string(), "source not connected");
        assert_eq!(
            SourceError::Unavailable("401 Unauthorized".into()).to_string(),
            "source unavailable: 401 Unauthorized"
        );
    }
}
