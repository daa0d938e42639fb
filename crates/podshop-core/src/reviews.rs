//! Review submission rules and rating summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserReview;
use crate::CoreError;

pub const MAX_REVIEW_IMAGES: usize = 3;

/// A review as submitted from the product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub user_id: Uuid,
    pub product_id: i64,
    pub rating: i16,
    pub comment: String,
    pub image_urls: Vec<String>,
}

/// Insert payload for `user_reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReviewRow<'a> {
    pub user_id: Uuid,
    pub product_id: i64,
    pub rating: i16,
    pub comment: &'a str,
    pub image_1_url: Option<&'a str>,
    pub image_2_url: Option<&'a str>,
    pub image_3_url: Option<&'a str>,
}

impl NewReview {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidReview`] when the rating is outside 1..=5,
    /// the comment is blank, or more than [`MAX_REVIEW_IMAGES`] images are
    /// attached.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=5).contains(&self.rating) {
            return Err(CoreError::InvalidReview(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        if self.comment.trim().is_empty() {
            return Err(CoreError::InvalidReview("comment is required".to_string()));
        }
        if self.image_urls.len() > MAX_REVIEW_IMAGES {
            return Err(CoreError::InvalidReview(format!(
                "at most {MAX_REVIEW_IMAGES} images allowed, got {}",
                self.image_urls.len()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_row(&self) -> NewReviewRow<'_> {
        let image = |i: usize| self.image_urls.get(i).map(String::as_str);
        NewReviewRow {
            user_id: self.user_id,
            product_id: self.product_id,
            rating: self.rating,
            comment: self.comment.trim(),
            image_1_url: image(0),
            image_2_url: image(1),
            image_3_url: image(2),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub count: usize,
    /// Mean rating rounded to one decimal place; `None` without reviews.
    pub average: Option<Decimal>,
}

impl ReviewSummary {
    #[must_use]
    pub fn from_reviews(reviews: &[UserReview]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }
        let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        let count = reviews.len();
        let average = Decimal::from(total) / Decimal::from(count);
        Self {
            count,
            average: Some(average.round_dp(1)),
        }
    }
}
