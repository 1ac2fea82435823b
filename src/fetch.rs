//! Concurrent retrieval of the fixed family of statement pages.
//!
//! One base location fans out to five page fetches issued concurrently.
//! Transport failures are isolated per page: a failed or non-success fetch
//! yields a blank document and the run continues with whatever arrived.

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::{header, redirect, Client};
use tracing::{debug, warn};
use url::Url;

use crate::extractors::{DocumentKind, SourceDocument};
use crate::ExtractError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

/// Desktop browser identities rotated per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

pub struct PageFetcher {
    client: Client,
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .build()
            .expect("failed to build http client");
        Self { client }
    }

    /// Fetch every page of the family for `base` concurrently. The returned
    /// documents follow [`DocumentKind::PRIORITY`] order; failed pages are
    /// present but blank.
    pub async fn fetch_all(&self, base: &str) -> Result<Vec<SourceDocument>, ExtractError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(ExtractError::InvalidInput);
        }
        let base = base.trim_end_matches('/');
        Url::parse(base)?;

        let fetches = DocumentKind::PRIORITY.map(|kind| {
            let url = format!("{base}{}", kind.path_suffix());
            self.fetch_one(url, kind)
        });
        Ok(futures::future::join_all(fetches).await)
    }

    async fn fetch_one(&self, url: String, kind: DocumentKind) -> SourceDocument {
        let agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, agent)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => {
                    debug!(%url, bytes = body.len(), "fetched page");
                    SourceDocument::new(url, kind, body)
                }
                Err(e) => {
                    warn!(%url, error = %e, "failed to read response body");
                    SourceDocument::new(url, kind, "")
                }
            },
            Ok(resp) => {
                warn!(%url, status = %resp.status(), "non-success response");
                SourceDocument::new(url, kind, "")
            }
            Err(e) => {
                warn!(%url, error = %e, "fetch failed");
                SourceDocument::new(url, kind, "")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_base_is_rejected() {
        let fetcher = PageFetcher::new();
        assert!(matches!(
            fetcher.fetch_all("   ").await,
            Err(ExtractError::InvalidInput)
        ));
    }

    #[tokio::test]
    async fn unparseable_base_is_rejected() {
        let fetcher = PageFetcher::new();
        assert!(matches!(
            fetcher.fetch_all("not a url").await,
            Err(ExtractError::InvalidBase(_))
        ));
    }
}
