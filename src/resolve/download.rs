//! Download-and-validate step shared by every resolver strategy.
//!
//! The byte-size floor is the pipeline's only guard against a strategy
//! returning decoy content (1x1 tracking pixels, broken-image thumbnails),
//! so rejected files are deleted rather than left on disk.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use super::error::ResolveError;
use super::fetch::Fetcher;

/// Empirical floor; see the catalog's history of 1x1 pixels and dead thumbs.
pub const DEFAULT_MIN_IMAGE_BYTES: u64 = 3000;

/// Local image store: downloads into a flat directory, one file per entry,
/// named `{id}.{ext}`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    fetcher: Fetcher,
    dir: PathBuf,
    min_bytes: u64,
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.contains("png") => "png",
        Some(ct) if ct.contains("webp") => "webp",
        _ => "jpg",
    }
}

impl ImageStore {
    pub fn new(fetcher: Fetcher, dir: impl Into<PathBuf>, min_bytes: u64) -> Self {
        Self {
            fetcher,
            dir: dir.into(),
            min_bytes,
        }
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when `filename` already exists on disk at or above the minimum
    /// size. Used by the skip rule for already-resolved entries.
    pub async fn has_valid(&self, filename: &str) -> bool {
        match fs::metadata(self.path_for(filename)).await {
            Ok(meta) => meta.len() >= self.min_bytes,
            Err(_) => false,
        }
    }

    /// Fetch `url`, infer the extension from the response content type and
    /// persist as `{id}.{ext}`. Files strictly below the minimum size are
    /// deleted and reported as `ImageTooSmall`.
    pub async fn download(&self, url: &str, id: &str) -> Result<String, ResolveError> {
        let page = self.fetcher.get(url).await?;
        if !page.status.is_success() {
            return Err(ResolveError::HttpStatus(page.status));
        }
        let ext = extension_for(page.content_type.as_deref());
        let filename = format!("{id}.{ext}");
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&filename);
        fs::write(&path, &page.body).await?;

        let size = page.body.len() as u64;
        if size < self.min_bytes {
            fs::remove_file(&path).await?;
            return Err(ResolveError::ImageTooSmall {
                size,
                min: self.min_bytes,
            });
        }
        info!(filename = %filename, bytes = size, "image saved");
        Ok(filename)
    }
}
