//! HTTP client for the Best Buy Products API.
//!
//! One call per category: the best-discounted page of products, with a
//! fixed field projection and sort order. Retries are not attempted here;
//! a failed fetch fails the ingestion run and the category waits for its
//! next scheduled slot.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::CatalogError;
use crate::types::{ProductsSearchResponse, RawProduct};

const DEFAULT_BASE_URL: &str = "https://api.bestbuy.com/";

/// Number of products requested per category.
pub const PAGE_SIZE: u32 = 20;

/// Field projection requested from the catalog.
pub const SHOW_FIELDS: &str =
    "sku,name,salePrice,onSale,percentSavings,dollarSavings,regularPrice,largeFrontImage,url";

/// Best deals first.
pub const SORT_ORDER: &str = "percentSavings.desc";

const API_KEY_PARAM: &str = "apiKey";

/// Client for the catalog products search endpoint.
///
/// Use [`CatalogClient::new`] for production or
/// [`CatalogClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Creates a client pointed at the production catalog API.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, CatalogError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// `timeout_secs` bounds the whole request, body included, so a stuck
    /// upstream cannot hold an ingestion run open indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`CatalogError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // A single trailing slash so `join` appends to the path instead of
        // replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| CatalogError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl {
                base_url: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Fetches the current best-discounted products for one category.
    ///
    /// `external_category_id` is embedded verbatim in the
    /// `products(categoryPath.id=...)` filter, so refinements such as
    /// `abcat0507010&search=AMD` pass straight through to the catalog.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Http`] on network failure or timeout.
    /// - [`CatalogError::RateLimited`] on HTTP 429.
    /// - [`CatalogError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`CatalogError::Deserialize`] if the body does not match the
    ///   expected shape.
    /// - [`CatalogError::InvalidCategory`] if the filter cannot be placed
    ///   in a request path.
    pub async fn fetch_category_products(
        &self,
        external_category_id: &str,
    ) -> Result<Vec<RawProduct>, CatalogError> {
        let url = self.build_url(external_category_id)?;
        let redacted = redact_api_key(&url);

        tracing::debug!(url = %redacted, "catalog: requesting category products");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Http(e.without_url()))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(CatalogError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
                url: redacted,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Http(e.without_url()))?;
        let parsed = serde_json::from_str::<ProductsSearchResponse>(&body).map_err(|e| {
            CatalogError::Deserialize {
                context: format!("products({external_category_id})"),
                source: e,
            }
        })?;

        Ok(parsed.products)
    }

    /// Builds the search URL with properly percent-encoded query parameters.
    fn build_url(&self, external_category_id: &str) -> Result<Url, CatalogError> {
        if external_category_id.trim().is_empty()
            || external_category_id.contains(['?', '#', '/', '(', ')'])
        {
            return Err(CatalogError::InvalidCategory {
                external_category_id: external_category_id.to_string(),
                reason: "filter must be non-empty and free of URL delimiters".to_string(),
            });
        }

        let mut url = self
            .base_url
            .join(&format!(
                "v1/products(categoryPath.id={external_category_id})"
            ))
            .map_err(|e| CatalogError::InvalidCategory {
                external_category_id: external_category_id.to_string(),
                reason: e.to_string(),
            })?;

        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("show", SHOW_FIELDS)
            .append_pair("sort", SORT_ORDER)
            .append_pair("pageSize", &PAGE_SIZE.to_string())
            .append_pair(API_KEY_PARAM, &self.api_key);

        Ok(url)
    }
}

/// Renders `url` with the API key value replaced, for logs and errors.
fn redact_api_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == API_KEY_PARAM {
                "[redacted]".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
