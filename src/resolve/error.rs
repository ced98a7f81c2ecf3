//! Error taxonomy for the image resolution pipeline.
//!
//! Parse failures never appear here: a page without usable metadata or a
//! search response without candidates is a normal `None`, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Network-level failure (DNS, connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Downloaded file was below the minimum byte threshold and was deleted.
    /// Catches 1x1 tracking pixels and broken-image thumbnails.
    #[error("downloaded image is {size} bytes, below the {min} byte minimum")]
    ImageTooSmall { size: u64, min: u64 },

    #[error("image store I/O: {0}")]
    Io(#[from] std::io::Error),
}
