//! Thin HTTP layer shared by every resolver strategy.
//!
//! One client, browser-like headers, a hard timeout, no internal retries.
//! Several of the upstream sites reject requests that identify as a default
//! HTTP client, so the user agent is a realistic desktop browser string.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use super::error::ResolveError;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// A fully read HTTP response. Non-success statuses are returned as pages,
/// not errors; callers decide whether a 404 is fatal for their strategy.
#[derive(Debug)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    http: Client,
}

impl Fetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ResolveError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let http = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http })
    }

    /// Single GET, fully buffered.
    pub async fn get(&self, url: &str) -> Result<FetchedPage, ResolveError> {
        self.get_with_query(url, &[]).await
    }

    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchedPage, ResolveError> {
        let mut req = self.http.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());
        let body = resp.bytes().await?.to_vec();
        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/page")
                .header("user-agent", BROWSER_USER_AGENT);
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html>ok</html>");
        });

        let fetcher = Fetcher::new(5).unwrap();
        let page = fetcher.get(&server.url("/page")).await.unwrap();
        mock.assert();
        assert!(page.status.is_success());
        assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(page.body_text(), "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let fetcher = Fetcher::new(5).unwrap();
        let page = fetcher.get(&server.url("/gone")).await.unwrap();
        assert_eq!(page.status.as_u16(), 404);
    }
}
