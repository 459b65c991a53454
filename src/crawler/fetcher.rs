//! The fetch seam between the worker pool and the HTTP client
//!
//! Workers only see the [`Fetch`] trait, so the pool can be driven by the
//! real [`FetchClient`] or by any other source of responses.

use crate::http::{FetchClient, FetchResult};
use crate::FetchError;
use async_trait::async_trait;

/// Something that turns a URL into a response
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Fetches one URL
    ///
    /// Implementations must be bounded in time: a worker awaiting this call
    /// cannot observe shutdown until it returns.
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}

#[async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        self.fetch_url(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_client_as_trait_object_validates_url() {
        let fetcher: Arc<dyn Fetch> = Arc::new(FetchClient::default());
        let err = fetcher.fetch("mailto:someone@example.com").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidUrl);

        let err = fetcher.fetch("gopher://example.com/").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedProtocol);
    }
}
