//! Page content keys and sources.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::trace;

use super::error::FetchError;

/// Default request timeout for content fetches in seconds.
pub const DEFAULT_CONTENT_TIMEOUT_SECS: u64 = 15;

/// Content pages served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSlug {
    Home,
    AboutUs,
    Complex,
    Apartments,
    Footer,
}

impl PageSlug {
    pub const ALL: [PageSlug; 5] = [
        PageSlug::Home,
        PageSlug::AboutUs,
        PageSlug::Complex,
        PageSlug::Apartments,
        PageSlug::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageSlug::Home => "home",
            PageSlug::AboutUs => "about-us",
            PageSlug::Complex => "complex",
            PageSlug::Apartments => "apartments",
            PageSlug::Footer => "footer",
        }
    }
}

impl fmt::Display for PageSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageSlug::ALL
            .into_iter()
            .find(|slug| slug.as_str() == s)
            .ok_or_else(|| format!("unknown page '{}'", s))
    }
}

/// A JSON document the backend serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKey {
    /// Editable page content.
    Page(PageSlug),
    /// The apartment listing.
    ApartmentList,
}

impl ContentKey {
    /// Key under which the document is cached.
    pub fn cache_key(&self) -> String {
        self.to_string()
    }

    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> String {
        match self {
            ContentKey::Page(slug) => format!("pages/{}", slug),
            ContentKey::ApartmentList => "apartments".to_string(),
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKey::Page(slug) => write!(f, "page:{}", slug),
            ContentKey::ApartmentList => f.write_str("apartments:list"),
        }
    }
}

/// Source of page content JSON.
///
/// Uses a boxed future so sources can be held as trait objects.
pub trait ContentSource: Send + Sync {
    /// Fetch one document.
    fn fetch(&self, key: ContentKey) -> BoxFuture<'_, Result<Value, FetchError>>;
}

/// Normalize a base URL so relative joins append to its path.
pub fn parse_base_url(base_url: &str) -> Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err(format!("'{}' cannot be used as a base URL", base_url));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Content source backed by the site's REST API.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: Client,
    base_url: Url,
}

impl HttpContentSource {
    /// Create a source for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_CONTENT_TIMEOUT_SECS))
    }

    /// Create a source with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = parse_base_url(base_url).map_err(|reason| FetchError::InvalidUrl {
            key: "base".to_string(),
            reason,
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// The API base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of a document.
    pub fn endpoint(&self, key: ContentKey) -> Result<Url, FetchError> {
        self.base_url
            .join(&key.path())
            .map_err(|e| FetchError::InvalidUrl {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_json(&self, key: ContentKey) -> Result<Value, FetchError> {
        let url = self.endpoint(key)?;
        trace!(%key, %url, "Fetching page content");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            reason: format!("failed to read response: {}", e),
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl ContentSource for HttpContentSource {
    fn fetch(&self, key: ContentKey) -> BoxFuture<'_, Result<Value, FetchError>> {
        self.fetch_json(key).boxed()
    }
}
