//! Customer design uploads.
//!
//! A design can be uploaded before its cart line exists. The metadata row is
//! written with a null `cart_id` and patched once the line is created.

use chrono::Utc;
use podshop_core::UploadedFile;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::query::Query;

/// Bucket holding customer design files.
pub const DESIGN_BUCKET: &str = "designs";

/// Insert payload for `uploaded_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUploadedFile {
    pub user_id: Uuid,
    pub cart_id: Option<i64>,
    pub file_name: String,
    pub file_path: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
}

/// Inserts an upload metadata row.
///
/// # Errors
///
/// Returns [`BackendError`] if the insert fails or returns no row.
pub async fn record_upload(
    client: &BackendClient,
    file: &NewUploadedFile,
) -> Result<UploadedFile, BackendError> {
    let rows: Vec<UploadedFile> = client.insert("uploaded_files", file).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::EmptyResponse {
            context: "insert into uploaded_files".to_owned(),
        })
}

/// Stores a design file and records it, unlinked, for `user_id`.
///
/// # Errors
///
/// Returns [`BackendError`] if the storage upload or the metadata insert fails.
pub async fn upload_design(
    client: &BackendClient,
    user_id: Uuid,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<UploadedFile, BackendError> {
    let key = design_key(user_id, Utc::now().timestamp_millis(), file_name);
    let size_bytes = i64::try_from(bytes.len()).ok();

    client
        .upload_object(DESIGN_BUCKET, &key, bytes, content_type)
        .await?;
    tracing::info!(%user_id, key = %key, "design uploaded");

    record_upload(
        client,
        &NewUploadedFile {
            user_id,
            cart_id: None,
            file_name: file_name.to_owned(),
            file_path: key,
            content_type: Some(content_type.to_owned()),
            size_bytes,
        },
    )
    .await
}

/// Attaches uploaded files to a cart line. No ids is a no-op.
///
/// # Errors
///
/// Returns [`BackendError`] if the update fails.
pub async fn link_uploads_to_cart(
    client: &BackendClient,
    upload_ids: &[i64],
    cart_id: i64,
) -> Result<(), BackendError> {
    if upload_ids.is_empty() {
        return Ok(());
    }
    let _: Vec<UploadedFile> = client
        .update(
            "uploaded_files",
            &Query::new().in_list("id", upload_ids.iter().copied()),
            &json!({ "cart_id": cart_id }),
        )
        .await?;
    tracing::debug!(cart_id, uploads = upload_ids.len(), "linked uploads to cart line");
    Ok(())
}

/// `{user_id}/{millis}-{name}` with the name reduced to
/// `[A-Za-z0-9._-]`.
fn design_key(user_id: Uuid, millis: i64, file_name: &str) -> String {
    let sanitized: String = file_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = if sanitized.is_empty() {
        "design"
    } else {
        sanitized.as_str()
    };
    format!("{user_id}/{millis}-{name}")
}
