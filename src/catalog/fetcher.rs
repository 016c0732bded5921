use super::QuestionCatalog;
use crate::cache::{CacheStore, KvStore};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Key the catalog is cached under.
pub const CATALOG_CACHE_KEY: &str = "catalog";

/// How long a fetched catalog is trusted.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const MAX_CATALOG_SIZE: usize = 1024 * 1024; // 1MB
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a network fetch of the catalog failed.
///
/// Internal to the fetcher: [`CatalogFetcher::load`] logs these and resolves
/// to an empty catalog instead of returning them.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid catalog body: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads the suggested-question catalog, serving from cache when possible.
pub struct CatalogFetcher<S> {
    client: reqwest::Client,
    endpoint: Url,
    cache: CacheStore<S>,
    ttl: Duration,
    timeout: Duration,
}

impl<S: KvStore> CatalogFetcher<S> {
    pub fn new(client: reqwest::Client, endpoint: Url, cache: CacheStore<S>) -> Self {
        Self {
            client,
            endpoint,
            cache,
            ttl: DEFAULT_CATALOG_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &CacheStore<S> {
        &self.cache
    }

    /// Resolve the catalog. Never fails.
    ///
    /// 1. A live cache entry is returned without touching the network.
    /// 2. Otherwise the endpoint is fetched; a successful body is cached for
    ///    the configured TTL and returned.
    /// 3. Any fetch failure yields an empty catalog so the caller can fall
    ///    back to its built-in questions.
    pub async fn load(&self) -> QuestionCatalog {
        if let Some(entry) = self.cache.get::<QuestionCatalog>(CATALOG_CACHE_KEY).await {
            tracing::debug!(
                categories = entry.payload.len(),
                expires_at_ms = entry.expires_at_ms,
                "Catalog cache hit"
            );
            return entry.payload;
        }

        match self.fetch().await {
            Ok(catalog) => {
                if let Err(e) = self.cache.set(CATALOG_CACHE_KEY, &catalog, self.ttl).await {
                    // Still usable this session, just refetched next time.
                    tracing::warn!(error = %e, "Failed to cache catalog");
                }
                tracing::info!(categories = catalog.len(), "Catalog fetched");
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Catalog unavailable, falling back to built-in questions"
                );
                QuestionCatalog::default()
            }
        }
    }

    /// Drop the cached catalog so the next `load` goes to the network.
    pub async fn invalidate(&self) -> Result<(), crate::cache::CacheError> {
        self.cache.delete(CATALOG_CACHE_KEY).await
    }

    async fn fetch(&self) -> Result<QuestionCatalog, CatalogError> {
        let request = self
            .client
            .get(self.endpoint.as_str())
            .header(reqwest::header::ACCEPT, "application/json");

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| CatalogError::Timeout)?
            .map_err(CatalogError::Network)?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status().as_u16()));
        }

        let body = read_limited_text(response, MAX_CATALOG_SIZE).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, CatalogError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(CatalogError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(CatalogError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(CatalogError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    // Invalid UTF-8 surfaces as a JSON parse error, which is the same outcome.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStore};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer, store: MemoryStore) -> CatalogFetcher<MemoryStore> {
        let endpoint = Url::parse(&format!("{}/api/predefined-questions", server.uri())).unwrap();
        let cache = CacheStore::with_clock(store, Arc::new(ManualClock::new(0)));
        CatalogFetcher::new(reqwest::Client::new(), endpoint, cache)
    }

    #[tokio::test]
    async fn test_success_is_returned_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/predefined-questions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"Colleges": {"All": ["Best colleges?"]}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let fetcher = fetcher_for(&server, store.clone());

        let catalog = fetcher.load().await;
        assert_eq!(catalog.questions("Colleges", "All"), ["Best colleges?"]);
        assert!(store.contains(CATALOG_CACHE_KEY));

        // Second load is served from cache; `expect(1)` verifies on drop.
        let again = fetcher.load().await;
        assert_eq!(again, catalog);
    }

    #[tokio::test]
    async fn test_server_error_yields_empty_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let fetcher = fetcher_for(&server, store.clone());

        assert!(fetcher.load().await.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_yields_empty_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, MemoryStore::new());
        assert!(fetcher.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_yields_empty_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("x".repeat(MAX_CATALOG_SIZE + 1)),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, MemoryStore::new());
        assert!(fetcher.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty_catalog() {
        // Port 9 (discard) on localhost is almost never listening.
        let endpoint = Url::parse("http://127.0.0.1:9/api/predefined-questions").unwrap();
        let cache = CacheStore::new(MemoryStore::new());
        let fetcher = CatalogFetcher::new(reqwest::Client::new(), endpoint, cache)
            .with_timeout(Duration::from_secs(2));

        assert!(fetcher.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Exams": {}}"#))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, MemoryStore::new());
        fetcher.load().await;
        fetcher.invalidate().await.unwrap();
        fetcher.load().await;
    }
}
