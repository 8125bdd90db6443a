//! hhfetch: batch fetcher for hh.ru vacancy search pages, saving raw HTML
//! for later offline parsing.

pub mod cli;
pub mod config;
pub mod fetcher;
pub mod model;
pub mod parse;
pub mod store;

// Re-exports for CLI and consumers.
pub use fetcher::{
    run_fetch, FetchError, FetchOptions, FetchedResponse, PageClient, PageClientBuilder,
    PageSource, RetryPolicy, BASE_URL, DEFAULT_CONTENT_MARKER,
};
pub use model::{FetchSummary, FetchTarget, RawPage};
pub use parse::{ParseError, Parser, Record, SerpParser};
pub use store::{PageStore, StoreError};
