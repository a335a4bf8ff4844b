//! Item listing and content fetching over HTTP.
//!
//! Both collaborators are traits: the engine only needs "give me the
//! current item handles" and "give me one item's decoded text". The HTTP
//! implementations here resolve handles against a base URL, apply
//! per-request timeouts, and decode bodies with a configurable fallback
//! charset.

use crate::config::FetchConfig;
use crate::models::ItemHandle;
use crate::{Error, Result};
use regex::Regex;
use std::future::Future;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Failure modes of fetching one item.
#[derive(Debug, ThisError)]
pub enum FetchError {
    /// The request did not complete within the per-attempt timeout.
    #[error("fetch timed out")]
    Timeout,
    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The remote answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The body could not be decoded to text.
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Produces the current set of item handles for a resource.
///
/// Listing happens once per round; a failed listing degrades the round to
/// an empty item set at the coordinator, so implementations should report
/// errors rather than retry internally.
pub trait ItemLister: Send + Sync {
    /// Lists the items currently published under `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing page cannot be fetched or parsed.
    fn list(&self, resource: &str) -> impl Future<Output = Result<Vec<ItemHandle>>> + Send;
}

/// Fetches and decodes the text of one item.
pub trait ContentFetcher: Send + Sync + 'static {
    /// Fetches the decoded text behind `item`.
    fn fetch(
        &self,
        item: &ItemHandle,
    ) -> impl Future<Output = std::result::Result<String, FetchError>> + Send;
}

/// Builds the shared HTTP client with the configured timeouts.
fn build_client(config: &FetchConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

/// Joins a handle onto the base URL unless it is already absolute.
fn resolve_url(base_url: &str, handle: &str) -> String {
    if handle.starts_with("http://") || handle.starts_with("https://") {
        return handle.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        handle.trim_start_matches('/')
    )
}

/// HTTP item lister: fetches a listing page and extracts item handles with
/// a configured regex.
///
/// Optionally two-stage: a `resolve_pattern` first extracts the listing
/// page's own handle from the resource's landing page (some sources hide
/// the feed behind an indirection), then the item pattern runs against the
/// resolved page.
pub struct HttpLister {
    client: reqwest::Client,
    base_url: String,
    item_re: Regex,
    resolve_re: Option<Regex>,
}

impl HttpLister {
    /// Creates a lister from the fetch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a configured pattern is not a
    /// valid regex.
    pub fn new(base_url: impl Into<String>, config: &FetchConfig) -> Result<Self> {
        let item_re = Regex::new(&config.item_pattern)
            .map_err(|e| Error::InvalidInput(format!("invalid item_pattern: {e}")))?;
        let resolve_re = config
            .resolve_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("invalid resolve_pattern: {e}")))?;

        Ok(Self {
            client: build_client(config),
            base_url: base_url.into(),
            item_re,
            resolve_re,
        })
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::operation("list_fetch", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::operation("list_fetch", format!("status {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| Error::operation("list_decode", e))
    }

    /// Extracts the first capture group of each match, or the whole match
    /// when the pattern has no groups.
    fn extract_all(re: &Regex, body: &str) -> Vec<String> {
        re.captures_iter(body)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl ItemLister for HttpLister {
    async fn list(&self, resource: &str) -> Result<Vec<ItemHandle>> {
        let mut target = resolve_url(&self.base_url, resource);

        if let Some(re) = &self.resolve_re {
            let landing = self.get_page(&target).await?;
            let Some(listing) = Self::extract_all(re, &landing).into_iter().next() else {
                return Err(Error::operation(
                    "list_resolve",
                    format!("resolve pattern matched nothing on {target}"),
                ));
            };
            target = resolve_url(&self.base_url, &listing);
        }

        let body = self.get_page(&target).await?;
        let handles = Self::extract_all(&self.item_re, &body)
            .into_iter()
            .map(ItemHandle::new)
            .collect();
        Ok(handles)
    }
}

/// HTTP content fetcher with charset-aware decoding.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    fallback_charset: String,
}

impl HttpFetcher {
    /// Creates a fetcher from the fetch configuration.
    #[must_use]
    pub fn new(base_url: impl Into<String>, config: &FetchConfig) -> Self {
        Self {
            client: build_client(config),
            base_url: base_url.into(),
            fallback_charset: config.fallback_charset.clone(),
        }
    }
}

impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, item: &ItemHandle) -> std::result::Result<String, FetchError> {
        let url = resolve_url(&self.base_url, item.as_str());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text_with_charset(&self.fallback_charset)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Decode(e.to_string())
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_joins_relative_handles() {
        assert_eq!(
            resolve_url("https://example.com/", "/post/1"),
            "https://example.com/post/1"
        );
        assert_eq!(
            resolve_url("https://example.com", "post/2"),
            "https://example.com/post/2"
        );
    }

    #[test]
    fn test_resolve_url_keeps_absolute_handles() {
        assert_eq!(
            resolve_url("https://example.com/", "https://other.net/p/3"),
            "https://other.net/p/3"
        );
    }

    #[test]
    fn test_extract_all_prefers_capture_group() {
        let re = Regex::new(r#"href="(/post/[0-9]+)""#).unwrap();
        let body = r#"<a href="/post/11">x</a><a href="/post/12">y</a>"#;
        assert_eq!(
            HttpLister::extract_all(&re, body),
            vec!["/post/11", "/post/12"]
        );
    }

    #[test]
    fn test_extract_all_whole_match_without_group() {
        let re = Regex::new(r"item-[0-9]+").unwrap();
        assert_eq!(
            HttpLister::extract_all(&re, "item-1 item-2 item-1"),
            vec!["item-1", "item-2", "item-1"]
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = FetchConfig {
            item_pattern: "(".to_string(),
            ..FetchConfig::default()
        };
        let result = HttpLister::new("https://example.com/", &config);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
