//! Resolving stored image keys to public URLs.

use crate::client::BackendClient;

/// Resolves an image reference to a public URL.
///
/// Absolute `http(s)://` references are returned unchanged and empty ones
/// resolve to `None`. Otherwise `buckets` are tried in order and the first
/// candidate is accepted; with `verify` each candidate is HEAD-checked and
/// only a 2xx answer accepts it.
pub async fn resolve_public_url(
    client: &BackendClient,
    key: &str,
    buckets: &[String],
    verify: bool,
) -> Option<String> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    if key.starts_with("http://") || key.starts_with("https://") {
        return Some(key.to_owned());
    }

    for bucket in buckets {
        let url = match client.public_object_url(bucket, key) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(bucket = %bucket, key, error = %e, "could not build public URL");
                continue;
            }
        };
        if !verify || client.head_ok(&url).await {
            return Some(url.into());
        }
        tracing::debug!(bucket = %bucket, key, "object not found in bucket");
    }

    None
}
