//! Google Books volumes client - looks up a book by ISBN and normalizes the
//! first result into a [`BookRecord`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::book::BookRecord;

use super::http_client::{HttpTimeouts, build_catalog_http_client};
use super::identifier::normalize_isbn;
use super::{CatalogSource, LookupError, LookupOutcome};

/// Default Google Books API base URL.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Path of the volumes search endpoint below the base URL.
const VOLUMES_PATH: &str = "books/v1/volumes";

/// Identifier type selected as the canonical isbn.
const ISBN_13_TYPE: &str = "ISBN_13";

// ==================== Volumes API Response Types ====================

/// Top-level volumes search response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumesResponse {
    #[allow(dead_code)] // Deserialized for Debug output; `items` is authoritative
    pub total_items: Option<u64>,
    pub items: Option<Vec<Volume>>,
}

/// One search hit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Volume {
    pub volume_info: Option<VolumeInfo>,
}

/// Bibliographic part of a search hit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeInfo {
    pub title: Option<String>,
    pub page_count: Option<u32>,
    pub published_date: Option<String>,
    pub language: Option<String>,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub industry_identifiers: Option<Vec<IndustryIdentifier>>,
}

/// A typed identifier (`ISBN_10`, `ISBN_13`, `OTHER`, ...).
#[derive(Debug, Deserialize)]
pub(crate) struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

// ==================== GoogleBooksClient ====================

/// Looks up books through the Google Books volumes endpoint.
///
/// Issues `GET {base}/books/v1/volumes?q=isbn:<isbn>` once per lookup; no
/// retries.
pub struct GoogleBooksClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    /// Creates a client for the public Google Books API.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if HTTP client construction fails.
    #[tracing::instrument(skip_all)]
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, LookupError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeouts)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the base URL does not parse or HTTP client
    /// construction fails.
    #[tracing::instrument(skip_all, fields(base_url))]
    pub fn with_base_url(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, LookupError> {
        let base_url = Url::parse(base_url).map_err(|error| {
            LookupError::failed_with_suggestion(
                "<client>",
                &format!("invalid catalog base URL '{base_url}': {error}"),
                "Set api_base_url to an absolute http(s) URL",
            )
        })?;
        let client = build_catalog_http_client(timeouts)?;

        Ok(Self {
            client,
            base_url,
            api_key: None,
        })
    }

    /// Sends `key=<api_key>` with every request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn volumes_url(&self, isbn: &str) -> Result<Url, LookupError> {
        let endpoint = format!(
            "{}/{VOLUMES_PATH}",
            self.base_url.as_str().trim_end_matches('/')
        );
        let mut url = Url::parse(&endpoint)
            .map_err(|error| LookupError::failed(isbn, &format!("invalid request URL: {error}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", &format!("isbn:{isbn}"));
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for GoogleBooksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleBooksClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogSource for GoogleBooksClient {
    fn name(&self) -> &'static str {
        "google_books"
    }

    #[tracing::instrument(skip(self), fields(catalog = "google_books"))]
    async fn lookup(&self, identifier: &str) -> Result<LookupOutcome, LookupError> {
        let isbn = normalize_isbn(identifier)?;
        let url = self.volumes_url(&isbn)?;

        debug!(isbn = %isbn, "Calling Google Books volumes API");

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Google Books request failed");
                return Err(LookupError::failed(
                    &isbn,
                    "Cannot reach the book catalog service",
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let reason = match status.as_u16() {
                400 => "Catalog rejected the request (check the API key)".to_string(),
                403 => "Catalog refused access (quota or API key)".to_string(),
                429 => "Catalog rate limit exceeded".to_string(),
                s if s >= 500 => "Catalog service unavailable".to_string(),
                s => format!("Catalog returned HTTP {s}"),
            };
            debug!(status = status.as_u16(), %reason, "Google Books API error");
            return Err(LookupError::failed_with_suggestion(
                &isbn,
                &reason,
                "Try again later",
            ));
        }

        let body = match response.json::<VolumesResponse>().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Failed to parse Google Books response JSON");
                return Err(LookupError::failed(
                    &isbn,
                    "Unexpected catalog response format",
                ));
            }
        };

        let Some(first) = body.items.and_then(|items| items.into_iter().next()) else {
            debug!(isbn = %isbn, "No volume found");
            return Ok(LookupOutcome::NotFound);
        };

        let info = first
            .volume_info
            .ok_or_else(|| LookupError::malformed(&isbn, "result has no volumeInfo"))?;
        let record = normalize_volume(info, &isbn)?;
        debug!(isbn = %record.isbn, title = %record.title, "Volume normalized");
        Ok(LookupOutcome::Found(record))
    }
}

// ==================== Normalization ====================

/// Turns a provider volume into a single-copy [`BookRecord`].
///
/// The record's isbn is the `ISBN_13` typed identifier, not the query string.
fn normalize_volume(info: VolumeInfo, queried: &str) -> Result<BookRecord, LookupError> {
    let isbn = info
        .industry_identifiers
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|id| id.kind == ISBN_13_TYPE)
        .map(|id| id.identifier.clone())
        .ok_or_else(|| LookupError::malformed(queried, "no ISBN_13 identifier in result"))?;

    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| LookupError::malformed(queried, "result has no title"))?;

    Ok(BookRecord {
        title,
        page_count: info.page_count.unwrap_or(0),
        published_date: info.published_date,
        language: info.language,
        authors: info.authors.unwrap_or_default(),
        publisher: info.publisher,
        isbn,
        copy_count: 1,
    })
}
