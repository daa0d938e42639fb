pub mod app_config;
pub mod catalog;
pub mod config;
pub mod favorites;
pub mod models;
pub mod pricing;
pub mod reviews;
pub mod selection;
pub mod stock;

pub use app_config::{AppConfig, Environment};
pub use catalog::{group_variant_rows, slug_from_path, InputType, VariantGroup, VariantOption};
pub use config::{load_app_config, load_app_config_from_env};
pub use favorites::{FavoriteIntent, FavoriteState};
pub use models::{
    CartLine, CartVariant, Favorite, InventoryRow, Product, ProductVariantCombination,
    ProductVariantValueRow, UploadedFile, UserReview, VariantGroupRow, VariantValueRow,
};
pub use pricing::{total_price, unit_price, Quantity, SizePricing, DEFAULT_PRICE_PER_INCREMENT};
pub use reviews::{NewReview, ReviewSummary, MAX_REVIEW_IMAGES};
pub use selection::{fill_defaults, restore_selection, SelectedVariant, Selection};
pub use stock::{aggregate_inventory, matching_combinations, StockLevel, StockPolicy, IN_STOCK};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid size pricing: {0}")]
    InvalidSizePricing(String),

    #[error("invalid review: {0}")]
    InvalidReview(String),

    #[error("unknown stock policy: {0}")]
    UnknownStockPolicy(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
