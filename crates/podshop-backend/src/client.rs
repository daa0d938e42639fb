//! HTTP client for the hosted backend's row and storage APIs.
//!
//! Every request carries the project key as `apikey` and a bearer token:
//! the signed-in user's access token when one is attached, otherwise the
//! project key itself. Non-2xx answers are decoded into
//! [`BackendError::Api`] so callers can branch on the error code.

use std::time::Duration;

use podshop_core::AppConfig;
use reqwest::{header, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::query::Query;

const REST_PREFIX: &str = "rest/v1/";
const STORAGE_PREFIX: &str = "storage/v1/object/";

/// Client for one backend project.
///
/// Use [`BackendClient::from_config`] in binaries and [`BackendClient::new`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .finish_non_exhaustive()
    }
}

/// Error envelope returned by the row API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    /// Storage API spelling.
    error: Option<String>,
}

impl BackendClient {
    /// Creates a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`BackendError::InvalidUrl`] if `base_url`
    /// does not parse.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("podshop/0.1 (storefront)")
            .build()?;

        // A trailing slash makes `Url::join` append rather than replace the
        // last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| BackendError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_owned(),
            access_token: None,
        })
    }

    /// # Errors
    ///
    /// See [`BackendClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.backend_url,
            &config.backend_key,
            config.request_timeout_secs,
        )
    }

    /// Returns a client that acts as the signed-in user.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Reads rows from `table`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] on a non-2xx status.
    /// - [`BackendError::Http`] on network failure.
    /// - [`BackendError::Deserialize`] if rows do not match `T`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.rest_url(table, query)?;
        let context = format!("select from {table}");
        let body = execute(self.authorized(self.client.get(url)), &context).await?;
        parse_rows(&body, &context)
    }

    /// Inserts `rows` (a struct or a slice of structs) and returns the
    /// inserted rows.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::select`].
    pub async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.rest_url(table, &Query::new())?;
        let context = format!("insert into {table}");
        let request = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(rows);
        let body = execute(request, &context).await?;
        parse_rows(&body, &context)
    }

    /// Inserts `rows` without reading them back.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] on a non-2xx status.
    /// - [`BackendError::Http`] on network failure.
    pub async fn insert_minimal<B>(&self, table: &str, rows: &B) -> Result<(), BackendError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.rest_url(table, &Query::new())?;
        let context = format!("insert into {table}");
        let request = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=minimal")
            .json(rows);
        execute(request, &context).await?;
        Ok(())
    }

    /// Applies `patch` to every row matching `query` and returns the updated rows.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::select`].
    pub async fn update<B, T>(
        &self,
        table: &str,
        query: &Query,
        patch: &B,
    ) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.rest_url(table, query)?;
        let context = format!("update {table}");
        let request = self
            .authorized(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(patch);
        let body = execute(request, &context).await?;
        parse_rows(&body, &context)
    }

    /// Deletes every row matching `query`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] on a non-2xx status.
    /// - [`BackendError::Http`] on network failure.
    pub async fn delete(&self, table: &str, query: &Query) -> Result<(), BackendError> {
        let url = self.rest_url(table, query)?;
        let context = format!("delete from {table}");
        execute(self.authorized(self.client.delete(url)), &context).await?;
        Ok(())
    }

    /// Public URL of an object: `<base>/storage/v1/object/public/<bucket>/<key>`.
    /// Key segments are percent-encoded individually.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn public_object_url(&self, bucket: &str, key: &str) -> Result<Url, BackendError> {
        self.storage_url(&["public", bucket], key)
    }

    /// Upload URL of an object: `<base>/storage/v1/object/<bucket>/<key>`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, BackendError> {
        self.storage_url(&[bucket], key)
    }

    /// Uploads raw bytes to storage.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] on a non-2xx status (e.g. the object exists).
    /// - [`BackendError::Http`] on network failure.
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let url = self.object_url(bucket, key)?;
        let context = format!("upload to {bucket}/{key}");
        let request = self
            .authorized(self.client.post(url))
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        execute(request, &context).await?;
        Ok(())
    }

    /// Sends a HEAD request and reports whether it answered 2xx. Network
    /// errors count as "not there".
    pub async fn head_ok(&self, url: &Url) -> bool {
        match self.client.head(url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "HEAD check failed");
                false
            }
        }
    }

    fn rest_url(&self, table: &str, query: &Query) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(REST_PREFIX)
            .and_then(|u| u.join(table))
            .map_err(|e| BackendError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !query.pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.pairs() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn storage_url(&self, prefix: &[&str], key: &str) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(STORAGE_PREFIX)
            .map_err(|e| BackendError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| BackendError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "base URL cannot carry a path".to_owned(),
            })?;
            segments.pop_if_empty();
            segments.extend(prefix);
            segments.extend(key.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }
}

/// Sends `request` and returns the body text of a 2xx response.
async fn execute(request: RequestBuilder, context: &str) -> Result<String, BackendError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body, context));
    }
    Ok(body)
}

fn api_error(status: u16, body: &str, context: &str) -> BackendError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_owned()
            }
        });

    tracing::debug!(
        status,
        code = parsed.code.as_deref(),
        context,
        "backend request failed"
    );

    BackendError::Api {
        status,
        code: parsed.code,
        message,
        details: parsed.details,
        hint: parsed.hint,
        context: context.to_owned(),
    }
}

/// Parses a row array. `return=minimal` writes and some deletes answer with
/// an empty body, which reads as no rows.
fn parse_rows<T: DeserializeOwned>(body: &str, context: &str) -> Result<Vec<T>, BackendError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<T>>(body).map_err(|e| BackendError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
