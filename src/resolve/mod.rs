//! The image resolution pipeline: a cascade of resolver strategies tried in
//! fixed priority order, followed by download-and-validate.

pub mod download;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod orchestrator;
pub mod search;

pub use download::{ImageStore, DEFAULT_MIN_IMAGE_BYTES};
pub use error::ResolveError;
pub use fetch::{Fetcher, DEFAULT_TIMEOUT_SECS};
pub use orchestrator::{
    load_overrides, EntryOverride, Outcome, OverrideMap, Resolver, RunOptions, RunSummary,
    Strategy,
};
pub use search::{SearchClient, DEFAULT_SEARCH_URL};
