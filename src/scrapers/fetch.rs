//! Page URL construction and HTML retrieval.
//!
//! # URL Pattern
//!
//! Page 1 of the catalog is the site root (`{base}/`); every later page lives
//! at `{base}/page{n}`.
//!
//! All requests of a run go through one [`HttpFetcher`], which wraps a single
//! `reqwest::Client` so the connection pool, timeout and `User-Agent` header
//! are shared across pages.

use crate::config::PipelineConfig;
use crate::error::{EtlError, FetchError, FetchErrorKind};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Build the URL for catalog page `page` under `base_url`.
///
/// # Errors
///
/// Returns [`EtlError::InvalidArgument`] when `page < 1`.
pub fn build_page_url(base_url: &str, page: i64) -> Result<String, EtlError> {
    if page < 1 {
        return Err(EtlError::invalid(format!("page must be >= 1, got {page}")));
    }
    let base = base_url.trim_end_matches('/');
    if page == 1 {
        Ok(format!("{base}/"))
    } else {
        Ok(format!("{base}/page{page}"))
    }
}

/// Anything that can turn a URL into page markup.
///
/// The catalog scraper is generic over this so it can be driven by an
/// in-memory source in tests.
pub trait FetchHtml {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP-backed [`FetchHtml`] with a fixed identity and timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, EtlError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| EtlError::invalid(format!("user agent {user_agent:?}: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| EtlError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, EtlError> {
        Self::new(&config.user_agent, config.timeout())
    }
}

impl FetchHtml for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url,
                FetchErrorKind::Status(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_transport(url, &e))?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const BASE: &str = "https://fashion-studio.dicoding.dev";

    /// Serve exactly one canned HTTP response on a random local port.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/")
    }

    fn fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new("fashion_etl-test", timeout).unwrap()
    }

    #[test]
    fn test_page_1_returns_root() {
        assert_eq!(build_page_url(BASE, 1).unwrap(), format!("{BASE}/"));
    }

    #[test]
    fn test_page_n_returns_indexed_path() {
        assert_eq!(build_page_url(BASE, 2).unwrap(), format!("{BASE}/page2"));
        assert_eq!(build_page_url(BASE, 50).unwrap(), format!("{BASE}/page50"));
    }

    #[test]
    fn test_trailing_slash_on_base_is_ignored() {
        assert_eq!(build_page_url("http://x.test/", 3).unwrap(), "http://x.test/page3");
    }

    #[test]
    fn test_invalid_pages_fail() {
        assert!(matches!(build_page_url(BASE, 0), Err(EtlError::InvalidArgument(_))));
        assert!(matches!(build_page_url(BASE, -1), Err(EtlError::InvalidArgument(_))));
    }

    #[test]
    fn test_page_urls_are_distinct() {
        let urls: std::collections::HashSet<_> =
            (1..=100).map(|p| build_page_url(BASE, p).unwrap()).collect();
        assert_eq!(urls.len(), 100);
    }

    #[tokio::test]
    async fn test_fetch_html_success() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 17\r\nConnection: close\r\n\r\n<html>Test</html>",
        )
        .await;
        let body = fetcher(Duration::from_secs(5)).fetch_html(&url).await.unwrap();
        assert_eq!(body, "<html>Test</html>");
    }

    #[tokio::test]
    async fn test_fetch_html_non_2xx_is_status_error() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let err = fetcher(Duration::from_secs(5)).fetch_html(&url).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Status(404));
        assert_eq!(err.url, url);
    }

    #[tokio::test]
    async fn test_fetch_html_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/");
        let err = fetcher(Duration::from_secs(5)).fetch_html(&url).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Connect);
    }

    #[tokio::test]
    async fn test_fetch_html_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let url = format!("http://{addr}/");
        let err = fetcher(Duration::from_millis(200))
            .fetch_html(&url)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Timeout);
    }
}
