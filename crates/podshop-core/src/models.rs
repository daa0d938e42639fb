//! Row shapes exchanged with the hosted backend.
//!
//! Catalog rows (`products`, `variant_groups`, `variant_values`,
//! `product_variant_values`, `product_variant_combinations`, `inventory`) are
//! maintained by the admin system and only ever read here. Cart, favorite,
//! review, and upload rows are written by the storefront.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row from `products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub starting_price: Decimal,
    /// Storage key or absolute URL of the primary product image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Storefront route, e.g. `"caps"` for `/products/caps`.
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A row from `variant_groups`, as embedded under a variant value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantGroupRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// `"radio"` or `"color"`; anything else renders as radio.
    #[serde(default)]
    pub input_type: Option<String>,
}

/// A row from `variant_values` with its group embedded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantValueRow {
    pub id: i64,
    pub value_name: String,
    #[serde(default)]
    pub variant_groups: Option<VariantGroupRow>,
}

/// A row from `product_variant_values` joined through `variant_values` to
/// `variant_groups`.
///
/// Requested with
/// `select=id,price,is_default,variant_values(id,value_name,variant_groups(id,name,input_type))`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductVariantValueRow {
    pub id: i64,
    /// Price delta added to the product's starting price. `NULL` means zero.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub variant_values: Option<VariantValueRow>,
}

/// A row from `product_variant_combinations`: one stockable set of
/// product-variant-value ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductVariantCombination {
    pub id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub variants: Vec<i64>,
}

/// A row from `inventory`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryRow {
    /// May be negative in the table; readers clamp to zero.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub low_stock_limit: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    pub combination_id: i64,
}

/// A row from `cart`. One row per distinct (user, product, variant set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_id: i64,
    pub user_id: Uuid,
    pub product_id: i64,
    pub quantity: u32,
    pub base_price: Decimal,
    pub total_price: Decimal,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A row from `cart_variants`: one selected option on a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartVariant {
    pub cart_id: i64,
    pub user_id: Uuid,
    /// The selected `product_variant_values.id`.
    pub cartvariant_id: i64,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// A row from `favorites`. Existence means "favorited".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub product_id: i64,
}

/// A row from `user_reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReview {
    pub id: i64,
    pub user_id: Uuid,
    pub product_id: i64,
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub image_1_url: Option<String>,
    #[serde(default)]
    pub image_2_url: Option<String>,
    #[serde(default)]
    pub image_3_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserReview {
    /// Returns the non-empty image URLs in slot order.
    #[must_use]
    pub fn image_urls(&self) -> Vec<&str> {
        [&self.image_1_url, &self.image_2_url, &self.image_3_url]
            .into_iter()
            .filter_map(|u| u.as_deref())
            .filter(|u| !u.is_empty())
            .collect()
    }
}

/// A row from `uploaded_files`.
///
/// Design uploads can start before the cart line exists, so `cart_id` is
/// `NULL` until the line is created and the row is patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: i64,
    pub user_id: Uuid,
    #[serde(default)]
    pub cart_id: Option<i64>,
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_variant_value_row_parses_embedded_join() {
        let json = serde_json::json!({
            "id": 11,
            "price": 20.0,
            "is_default": false,
            "variant_values": {
                "id": 4,
                "value_name": "L",
                "variant_groups": { "id": 2, "name": "SIZE", "input_type": "radio" }
            }
        });
        let row: ProductVariantValueRow = serde_json::from_value(json).expect("parse row");
        let value = row.variant_values.expect("embedded value");
        assert_eq!(value.value_name, "L");
        assert_eq!(value.variant_groups.expect("embedded group").id, 2);
        assert_eq!(row.price, Some(Decimal::new(20, 0)));
    }

    #[test]
    fn inventory_row_tolerates_missing_optional_columns() {
        let json = serde_json::json!({ "quantity": 5, "combination_id": 9 });
        let row: InventoryRow = serde_json::from_value(json).expect("parse row");
        assert_eq!(row.quantity, 5);
        assert!(row.low_stock_limit.is_none());
        assert!(row.status.is_none());
    }

    #[test]
    fn review_image_urls_skips_empty_slots() {
        let review = UserReview {
            id: 1,
            user_id: Uuid::nil(),
            product_id: 3,
            rating: 5,
            comment: Some("Great fit".to_string()),
            image_1_url: Some("https://cdn.example.com/a.jpg".to_string()),
            image_2_url: Some(String::new()),
            image_3_url: Some("https://cdn.example.com/c.jpg".to_string()),
            created_at: Utc::now(),
        };
        assert_eq!(
            review.image_urls(),
            vec!["https://cdn.example.com/a.jpg", "https://cdn.example.com/c.jpg"]
        );
    }
}
