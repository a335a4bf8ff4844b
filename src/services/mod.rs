//! The sampling engine: listing, fetching, scoring, aggregation.
//!
//! Fan-out, retry, and aggregation live here. The collaborator seams
//! ([`ItemLister`], [`ContentFetcher`]) are traits so tests and embedders
//! can substitute the HTTP implementations.

mod fetch;
mod monitor;
mod round;
mod worker;

pub use fetch::{ContentFetcher, FetchError, HttpFetcher, HttpLister, ItemLister};
pub use monitor::MonitorLoop;
pub use round::RoundCoordinator;
pub use worker::RetryPolicy;
