//! REST client for json-server style endpoints

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::warn;
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::query::Page;
use crate::query::PageRequest;
use crate::source::DataSource;

/// Response header carrying the total row count across all pages.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// HTTP data source speaking the `_page`/`_limit`/`_sort`/`_order` dialect.
///
/// Requests look like `GET {base}/{endpoint}?_page=1&_limit=5&_sort=name&_order=asc`
/// and expect a JSON array body plus an `X-Total-Count` header.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across coordinators.
///
/// # Example
///
/// ```ignore
/// use masterdetail_lib::RestClient;
///
/// let client = RestClient::builder()
///     .base_url("https://jsonplaceholder.typicode.com")
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    base_url: String,
    http_client: Client,
    timeout: Option<Duration>,
}

impl RestClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> RestClientBuilder<Missing> {
        RestClientBuilder::new()
    }

    /// Returns the base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Builds the full request URL for an endpoint and page request.
    pub fn page_url(&self, endpoint: &str, request: &PageRequest) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.inner.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", joined, e)))?;
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        Ok(url)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DataSource for RestClient {
    async fn fetch_page(&self, endpoint: &str, request: &PageRequest) -> Result<Page<Value>, ApiError> {
        let url = self.page_url(endpoint, request)?;
        debug!("GET {}", url);

        let mut builder = self.inner.http_client.get(url).header(ACCEPT, "application/json");
        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.inner.timeout))?;

        let status = response.status();
        let total_count = total_count(response.headers());

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, self.inner.timeout))?;

        if !status.is_success() {
            return Err(ApiError::http(status.as_u16(), body));
        }

        let records: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| ApiError::parse_with_body(format!("expected a JSON array of records: {}", e), body))?;

        Ok(Page::new(records, total_count))
    }
}

/// Reads the total-count header, treating absent or malformed values as zero.
pub fn total_count(headers: &HeaderMap) -> u64 {
    let Some(value) = headers.get(TOTAL_COUNT_HEADER) else {
        return 0;
    };
    match value.to_str().ok().and_then(|v| v.trim().parse().ok()) {
        Some(count) => count,
        None => {
            warn!("Ignoring malformed {} header: {:?}", TOTAL_COUNT_HEADER, value);
            0
        }
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`RestClient`].
///
/// Uses the typestate pattern so `build` is only available once the base
/// URL has been set.
pub struct RestClientBuilder<BaseUrl> {
    base_url: BaseUrl,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl RestClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the API base URL (e.g. `https://jsonplaceholder.typicode.com`).
    pub fn base_url(self, url: impl Into<String>) -> RestClientBuilder<Set<String>> {
        RestClientBuilder {
            base_url: Set(url.into()),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for RestClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> RestClientBuilder<U> {
    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl RestClientBuilder<Set<String>> {
    /// Builds the [`RestClient`].
    pub fn build(self) -> Result<RestClient, ApiError> {
        let base_url = self.base_url.0;
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(RestClient {
            inner: Arc::new(RestClientInner {
                base_url,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}
