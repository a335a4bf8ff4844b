//! # Lexmon
//!
//! Keyword-trend monitor for remote text feeds.
//!
//! Lexmon periodically samples every item currently listed on a remote
//! resource (for example the posts of a community page), scores each item's
//! text against a fixed multi-category keyword lexicon, and folds the
//! per-category hit counts into a bounded in-memory time series. Each round
//! is appended to a tab-separated log file and rendered to an SVG trend
//! chart, both served from a small HTTP status endpoint.
//!
//! ## Architecture
//!
//! - One sampling round fans out one task per listed item; workers retry
//!   transient fetch failures with fixed backoff and report exactly one
//!   completion each.
//! - The round coordinator waits for every completion, bounded by a round
//!   deadline, and always produces a well-formed [`RoundResult`].
//! - The monitor loop owns the [`Lexicon`] and [`TimeSeriesStore`] and is
//!   their only writer; per-round counters are the only concurrently
//!   mutated state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lexmon::{Category, Lexicon, score};
//!
//! let lexicon = Lexicon::new(vec![
//!     Category::new("incidents", ["outage", "down"])?,
//! ])?;
//! let counts = score("the service is down again", &lexicon);
//! assert_eq!(counts, vec![1]);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate
// transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod scanner;
pub mod series;
pub mod server;
pub mod services;

// Re-exports for convenience
pub use config::LexmonConfig;
pub use models::{Category, ItemHandle, ItemOutcome, Lexicon, RoundResult};
pub use scanner::score;
pub use series::TimeSeriesStore;
pub use services::{
    ContentFetcher, FetchError, HttpFetcher, HttpLister, ItemLister, MonitorLoop, RetryPolicy,
    RoundCoordinator,
};

/// Error type for lexmon operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty category keyword sets, malformed lexicon config, bad addresses |
/// | `OperationFailed` | I/O errors, HTTP failures, render failures, config parse failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A category is constructed with an empty keyword set
    /// - A lexicon is constructed with no categories
    /// - A round result of the wrong width is appended to the series
    /// - The listen address or a resource URL cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - The round log cannot be opened or written
    /// - The chart artifact cannot be written
    /// - The status server cannot bind its listener
    /// - The configuration file cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Convenience constructor for [`Error::OperationFailed`].
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for lexmon operations.
pub type Result<T> = std::result::Result<T, Error>;
