//! Product reviews.

use podshop_core::{CoreError, NewReview, UserReview};
use thiserror::Error;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::query::Query;

const REVIEW_COLUMNS: &str =
    "id,user_id,product_id,rating,comment,image_1_url,image_2_url,image_3_url,created_at";

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Reviews for a product, newest first.
///
/// # Errors
///
/// Returns [`BackendError`] if the backend request fails.
pub async fn list_reviews(
    client: &BackendClient,
    product_id: i64,
) -> Result<Vec<UserReview>, BackendError> {
    client
        .select(
            "user_reviews",
            &Query::new()
                .select(REVIEW_COLUMNS)
                .eq("product_id", product_id)
                .order("created_at", false),
        )
        .await
}

/// Validates and stores a review.
///
/// # Errors
///
/// - [`ReviewError::Invalid`] if validation fails; nothing is sent.
/// - [`ReviewError::Backend`] if the insert fails or returns no row.
pub async fn submit_review(
    client: &BackendClient,
    review: &NewReview,
) -> Result<UserReview, ReviewError> {
    review.validate()?;

    let rows: Vec<UserReview> = client.insert("user_reviews", &review.to_row()).await?;
    let stored = rows
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::EmptyResponse {
            context: "insert into user_reviews".to_owned(),
        })?;

    tracing::info!(
        review_id = stored.id,
        product_id = stored.product_id,
        rating = stored.rating,
        "review submitted"
    );
    Ok(stored)
}
