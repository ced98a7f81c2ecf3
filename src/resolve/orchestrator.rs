//! Per-entry strategy cascade and the batch run loop.
//!
//! Strategies run in a fixed priority order; the first resolved URL that
//! survives download-and-validate wins. Exhausting every strategy is a
//! per-entry outcome, not a batch failure.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::catalog::{is_remote_reference, CatalogEntry};

use super::download::ImageStore;
use super::error::ResolveError;
use super::fetch::Fetcher;
use super::metadata::extract_preview_image;
use super::search::SearchClient;

/// Per-identifier override: a known-good direct URL and/or a curated search
/// phrase for entries the automatic queries get wrong.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryOverride {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub search_query: Option<String>,
}

pub type OverrideMap = HashMap<String, EntryOverride>;

/// Load the override map from a JSON file shaped like
/// `{ "<id>": { "image_url": "...", "search_query": "..." } }`.
pub fn load_overrides(path: &Path) -> Result<OverrideMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read overrides file {}", path.display()))?;
    let map: OverrideMap = serde_json::from_str(&raw)
        .with_context(|| format!("overrides file {} is not valid JSON", path.display()))?;
    Ok(map)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Override,
    ManualQuery,
    TransparentSearch,
    GenericSearch,
    OfficialMetadata,
}

impl Strategy {
    pub const ORDER: [Strategy; 5] = [
        Strategy::Override,
        Strategy::ManualQuery,
        Strategy::TransparentSearch,
        Strategy::GenericSearch,
        Strategy::OfficialMetadata,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Override => "override",
            Strategy::ManualQuery => "manual_query",
            Strategy::TransparentSearch => "transparent_search",
            Strategy::GenericSearch => "generic_search",
            Strategy::OfficialMetadata => "official_metadata",
        }
    }
}

/// Result of resolving a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Downloaded and validated; the catalog should point at `filename`.
    Resolved {
        filename: String,
        strategy: Strategy,
    },
    /// Every strategy was exhausted without a validated image.
    NoImageFound,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub force: bool,
    pub dry_run: bool,
    /// Politeness delay between entries that performed network work.
    pub delay: Duration,
    /// Optional cap on processed entries.
    pub limit: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force: false,
            dry_run: false,
            delay: Duration::from_secs(4),
            limit: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Entries a dry run would have attempted.
    pub planned: usize,
}

pub struct Resolver {
    fetcher: Fetcher,
    search: SearchClient,
    store: ImageStore,
    overrides: OverrideMap,
    options: RunOptions,
}

impl Resolver {
    pub fn new(
        fetcher: Fetcher,
        search: SearchClient,
        store: ImageStore,
        overrides: OverrideMap,
        options: RunOptions,
    ) -> Self {
        Self {
            fetcher,
            search,
            store,
            overrides,
            options,
        }
    }

    /// Transform the catalog: returns a new catalog with updated image
    /// references plus a summary. Entries are never removed; a failed
    /// resolution leaves the prior reference untouched.
    pub async fn run(&self, catalog: &[CatalogEntry]) -> (Vec<CatalogEntry>, RunSummary) {
        let mut out = catalog.to_vec();
        let mut summary = RunSummary::default();
        let total = self
            .options
            .limit
            .map_or(out.len(), |l| l.min(out.len()));

        for (idx, entry) in out.iter_mut().take(total).enumerate() {
            info!(id = %entry.id, brand = %entry.brand, model = %entry.model, "processing entry");

            if self.already_resolved(entry).await {
                debug!(id = %entry.id, "local image present and valid; skipping");
                summary.skipped += 1;
                continue;
            }

            if self.options.dry_run {
                info!(id = %entry.id, "dry-run: would attempt resolution");
                summary.planned += 1;
                continue;
            }

            match self.resolve_entry(entry).await {
                Outcome::Resolved { filename, strategy } => {
                    info!(id = %entry.id, strategy = strategy.label(), filename = %filename, "entry resolved");
                    entry.set_display_image(&filename);
                    summary.updated += 1;
                }
                Outcome::NoImageFound => {
                    warn!(id = %entry.id, "no image found after all strategies");
                    summary.failed += 1;
                }
            }

            // Politeness toward third-party servers, not a perf knob.
            if idx + 1 < total && !self.options.delay.is_zero() {
                sleep(self.options.delay).await;
            }
        }

        info!(
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "image resolution run complete"
        );
        (out, summary)
    }

    async fn already_resolved(&self, entry: &CatalogEntry) -> bool {
        if self.options.force {
            return false;
        }
        match entry.display_image() {
            Some(image) if !is_remote_reference(image) => self.store.has_valid(image).await,
            _ => false,
        }
    }

    /// Run the strategy cascade for one entry. Advances past a strategy when
    /// it yields no URL, errors, or its download fails validation.
    pub async fn resolve_entry(&self, entry: &CatalogEntry) -> Outcome {
        for strategy in Strategy::ORDER {
            let candidate = match self.candidate_for(strategy, entry).await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    debug!(id = %entry.id, strategy = strategy.label(), "no candidate");
                    continue;
                }
                Err(e) => {
                    warn!(id = %entry.id, strategy = strategy.label(), error = %e, "strategy failed");
                    continue;
                }
            };
            info!(id = %entry.id, strategy = strategy.label(), url = %candidate, "candidate found");
            match self.store.download(&candidate, &entry.id).await {
                Ok(filename) => {
                    return Outcome::Resolved { filename, strategy };
                }
                Err(e) => {
                    warn!(
                        id = %entry.id,
                        strategy = strategy.label(),
                        error = %e,
                        "download rejected; trying next strategy"
                    );
                }
            }
        }
        Outcome::NoImageFound
    }

    async fn candidate_for(
        &self,
        strategy: Strategy,
        entry: &CatalogEntry,
    ) -> Result<Option<String>, ResolveError> {
        match strategy {
            Strategy::Override => Ok(self
                .overrides
                .get(&entry.id)
                .and_then(|o| o.image_url.clone())),
            Strategy::ManualQuery => {
                let Some(query) = self
                    .overrides
                    .get(&entry.id)
                    .and_then(|o| o.search_query.as_deref())
                else {
                    return Ok(None);
                };
                // Curated phrases get the transparent filter first, then a
                // plain pass, matching the order that produced the phrase.
                if let Some(url) = self.search.find_image(query, true).await? {
                    return Ok(Some(url));
                }
                self.search.find_image(query, false).await
            }
            Strategy::TransparentSearch => {
                let query = match entry.year {
                    Some(year) => {
                        format!("{} {} {} side profile", entry.brand, entry.model, year)
                    }
                    None => format!("{} {} side profile", entry.brand, entry.model),
                };
                self.search.find_image(&query, true).await
            }
            Strategy::GenericSearch => {
                let query = format!("{} {} side view", entry.brand, entry.model);
                self.search.find_image(&query, false).await
            }
            Strategy::OfficialMetadata => {
                let Some(url) = entry.official_url.as_deref() else {
                    return Ok(None);
                };
                let page = self.fetcher.get(url).await?;
                if !page.status.is_success() {
                    warn!(id = %entry.id, status = %page.status, "official page rejected the request");
                    return Ok(None);
                }
                Ok(extract_preview_image(&page.body_text()))
            }
        }
    }
}
