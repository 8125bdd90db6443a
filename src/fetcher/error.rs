//! Error type for fetching and persisting pages.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that end a single target's fetch. None of these abort the run;
/// the loop logs them and moves to the next target.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        source: reqwest::Error,
    },

    #[error("Failed to read response body for {url}: {source}")]
    BodyRead {
        url: String,
        source: reqwest::Error,
    },

    /// A retryable status was still being served on the final attempt.
    #[error("HTTP {status} from {url} persisted after all retry attempts")]
    RetriesExhausted { status: u16, url: String },

    #[error("Failed to write page to {path}: {source}")]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
}
