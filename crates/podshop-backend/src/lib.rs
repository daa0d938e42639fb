//! Async services over the hosted backend.
//!
//! [`BackendClient`] speaks the row and storage APIs; the modules built on
//! it implement the storefront operations (catalog loading, stock, cart,
//! favorites, reviews, uploads) and the product page that composes them.

pub mod cart;
pub mod catalog;
pub mod client;
pub mod error;
pub mod favorites;
pub mod page;
pub mod query;
pub mod reviews;
pub mod stock;
pub mod storage;
pub mod uploads;

pub use cart::{
    find_matching_line, load_cart_line_for_edit, remove_cart_line, upsert_cart_line, AddToCart,
    CartError, CartOutcome, EditableCartLine, ALREADY_IN_CART_MESSAGE,
};
pub use catalog::{find_product_by_slug, load_combinations, load_inventory, load_variant_groups};
pub use client::BackendClient;
pub use error::{BackendError, UNIQUE_VIOLATION};
pub use favorites::{is_favorited, toggle_favorite};
pub use page::{load_product_page, PageRequest, ProductPage, ReviewsPanel};
pub use query::Query;
pub use reviews::{list_reviews, submit_review, ReviewError};
pub use stock::resolve_stock;
pub use storage::resolve_public_url;
pub use uploads::{link_uploads_to_cart, record_upload, upload_design, NewUploadedFile};
