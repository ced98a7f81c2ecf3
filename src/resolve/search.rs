//! Image-search scraping: query construction plus `murl` candidate
//! extraction from the engine's results page.
//!
//! Bing embeds per-result metadata as JSON inside the HTML source; the media
//! URL lives under the `murl` key, usually with HTML-entity-escaped quotes.
//! This is an undocumented format the engine can change without notice, so
//! zero matches is an expected outcome, never a bug. The matching itself is
//! kept behind `extract_candidate_urls` so it can be swapped or hardened
//! without touching the orchestrator.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use super::error::ResolveError;
use super::fetch::Fetcher;

/// Host substring identifying the engine's own UI chrome images, which must
/// never be returned as candidates.
const ENGINE_DOMAIN: &str = "bing";

pub const DEFAULT_SEARCH_URL: &str = "https://www.bing.com/images/search";

fn murl_escaped() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"murl&quot;:&quot;(https?://.*?\.(?:png|jpg|jpeg|webp))&quot;"#)
            .expect("static murl pattern")
    })
}

fn murl_raw() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"murl":"(https?://.*?\.(?:png|jpg|jpeg|webp))""#)
            .expect("static murl pattern")
    })
}

/// Pull every embedded media URL out of a results page, in document order.
/// Tries the entity-escaped variant first and falls back to raw quotes.
pub fn extract_candidate_urls(body: &str) -> Vec<String> {
    let mut out: Vec<String> = murl_escaped()
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect();
    if out.is_empty() {
        out = murl_raw()
            .captures_iter(body)
            .map(|c| c[1].to_string())
            .collect();
    }
    out
}

fn hosted_by_engine(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(u) => u
            .host_str()
            .map(|h| h.to_ascii_lowercase().contains(ENGINE_DOMAIN))
            .unwrap_or(true),
        // Unparseable candidates are useless downstream; treat like chrome.
        Err(_) => true,
    }
}

/// First candidate not hosted by the engine itself, in document order.
pub fn first_usable_candidate(body: &str) -> Option<String> {
    extract_candidate_urls(body)
        .into_iter()
        .find(|u| !hosted_by_engine(u))
}

/// One image-search backend. The base URL is injectable so tests can point
/// at a local server.
#[derive(Debug, Clone)]
pub struct SearchClient {
    fetcher: Fetcher,
    base_url: String,
}

impl SearchClient {
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_base_url(fetcher, DEFAULT_SEARCH_URL)
    }

    pub fn with_base_url(fetcher: Fetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    /// Run one image search and return the first usable candidate URL.
    ///
    /// `transparent` adds the engine's transparent-background filter on top
    /// of the always-on large-image filter. A rejected or empty response
    /// degrades to `Ok(None)`.
    pub async fn find_image(
        &self,
        query: &str,
        transparent: bool,
    ) -> Result<Option<String>, ResolveError> {
        let mut filters = String::from("+filterui:imagesize-large");
        if transparent {
            filters.push_str("+filterui:photo-transparent");
        }
        let page = self
            .fetcher
            .get_with_query(
                &self.base_url,
                &[("q", query), ("qft", &filters), ("form", "HDRSC2"), ("first", "1")],
            )
            .await?;
        if !page.status.is_success() {
            warn!(status = %page.status, query, "image search rejected the request");
            return Ok(None);
        }
        let body = page.body_text();
        let found = first_usable_candidate(&body);
        debug!(query, transparent, found = found.is_some(), "image search done");
        Ok(found)
    }
}
