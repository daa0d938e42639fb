//! Product page state and its loader.
//!
//! Every product template (caps, shirts, signage, stickers, ...) runs the same
//! sequence: resolve the product from the URL slug, load its variant groups,
//! restore the selection of the cart line being edited, fill defaults, price
//! it, then fetch stock, favorite status, reviews and the image. Parts that
//! fail degrade to their empty value instead of failing the page.

use podshop_core::{
    fill_defaults, restore_selection, total_price, unit_price, FavoriteState, Product, Quantity,
    ReviewSummary, Selection, StockLevel, StockPolicy, UserReview, VariantGroup,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cart::{load_cart_line_for_edit, AddToCart, EditableCartLine};
use crate::catalog::{find_product_by_slug, load_variant_groups};
use crate::client::BackendClient;
use crate::favorites::is_favorited;
use crate::reviews::list_reviews;
use crate::stock::resolve_stock;
use crate::storage::resolve_public_url;

/// What the page was opened with.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub slug: &'a str,
    pub user_id: Option<Uuid>,
    /// Cart line being edited (`?edit=<cart_id>`).
    pub edit_cart_id: Option<i64>,
    pub stock_policy: StockPolicy,
    pub image_buckets: &'a [String],
    /// HEAD-check image candidates before accepting one.
    pub verify_images: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewsPanel {
    Loaded {
        reviews: Vec<UserReview>,
        summary: ReviewSummary,
    },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    /// `None` renders blank fields.
    pub product: Option<Product>,
    pub user_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub groups: Vec<VariantGroup>,
    /// The variant groups could not be loaded. Stock stays unknown and the
    /// page cannot be added to the cart.
    pub variants_unavailable: bool,
    pub selection: Selection,
    pub quantity: Quantity,
    /// Set only when the edited line was found for this user.
    pub edit_cart_id: Option<i64>,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// `None` while unknown: selection incomplete, not yet refreshed, or
    /// lookup failed.
    pub stock: Option<StockLevel>,
    pub favorite: FavoriteState,
    pub reviews: ReviewsPanel,
}

impl ProductPage {
    fn blank(user_id: Option<Uuid>) -> Self {
        Self {
            product: None,
            user_id,
            image_url: None,
            groups: Vec::new(),
            variants_unavailable: false,
            selection: Selection::new(),
            quantity: Quantity::ONE,
            edit_cart_id: None,
            unit_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
            stock: None,
            favorite: FavoriteState::Idle,
            reviews: ReviewsPanel::Unavailable,
        }
    }

    /// Selects an option and reprices. Returns `false` if the group or the
    /// option is unknown. Stock becomes unknown until
    /// [`ProductPage::refresh_stock`] runs.
    pub fn select_option(&mut self, group_id: i64, option_id: i64) -> bool {
        let Some(option) = self
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .and_then(|g| g.option(option_id))
        else {
            return false;
        };
        self.selection.select(group_id, option);
        self.stock = None;
        self.reprice();
        true
    }

    pub fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
        self.reprice();
    }

    /// Re-reads stock for the current selection.
    pub async fn refresh_stock(&mut self, client: &BackendClient, policy: StockPolicy) {
        self.stock = match &self.product {
            Some(product) if !self.variants_unavailable => {
                resolve_stock(client, product.id, &self.selection, &self.groups, policy).await
            }
            _ => None,
        };
    }

    /// Builds the cart request for the current state, or `None` without a
    /// product or its variant groups.
    #[must_use]
    pub fn add_to_cart<'a>(&'a self, pending_uploads: &'a [i64]) -> Option<AddToCart<'a>> {
        if self.variants_unavailable {
            return None;
        }
        let product = self.product.as_ref()?;
        Some(AddToCart {
            user_id: self.user_id,
            product,
            groups: &self.groups,
            selection: &self.selection,
            quantity: self.quantity,
            unit_price: self.unit_price,
            edit_cart_id: self.edit_cart_id,
            pending_uploads,
        })
    }

    fn reprice(&mut self) {
        let base = self
            .product
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.starting_price);
        self.unit_price = unit_price(base, &self.selection);
        self.total_price = total_price(self.unit_price, self.quantity);
    }
}

/// Loads everything the product page shows.
pub async fn load_product_page(client: &BackendClient, request: &PageRequest<'_>) -> ProductPage {
    let mut page = ProductPage::blank(request.user_id);

    let product = match find_product_by_slug(client, request.slug).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            tracing::info!(slug = request.slug, "no product for slug");
            return page;
        }
        Err(e) => {
            tracing::error!(slug = request.slug, error = %e, "product lookup failed");
            return page;
        }
    };

    let (groups, edit_line) = tokio::join!(
        load_variant_groups(client, product.id),
        load_edit_line(client, request, product.id)
    );
    match groups {
        Ok(groups) => page.groups = groups,
        Err(e) => {
            tracing::error!(product_id = product.id, error = %e, "variant load failed");
            page.variants_unavailable = true;
        }
    }

    if let Some(edit) = edit_line {
        page.selection = restore_selection(&edit.variant_ids, &page.groups);
        page.quantity = Quantity::new(edit.line.quantity);
        page.edit_cart_id = Some(edit.line.cart_id);
    }
    fill_defaults(&mut page.selection, &page.groups);
    page.product = Some(product);
    page.reprice();

    let Some(product) = page.product.as_ref() else {
        return page;
    };
    let stock = async {
        if page.variants_unavailable {
            return None;
        }
        resolve_stock(
            client,
            product.id,
            &page.selection,
            &page.groups,
            request.stock_policy,
        )
        .await
    };
    let (stock, favorite, reviews, image_url) = tokio::join!(
        stock,
        load_favorite(client, request.user_id, product.id),
        load_reviews(client, product.id),
        resolve_image(client, product, request),
    );

    page.stock = stock;
    page.favorite = favorite;
    page.reviews = reviews;
    page.image_url = image_url;
    page
}

/// The line being edited, if it belongs to this user and this product.
async fn load_edit_line(
    client: &BackendClient,
    request: &PageRequest<'_>,
    product_id: i64,
) -> Option<EditableCartLine> {
    let (Some(cart_id), Some(user_id)) = (request.edit_cart_id, request.user_id) else {
        return None;
    };
    match load_cart_line_for_edit(client, cart_id, user_id).await {
        Ok(edit) if edit.line.product_id == product_id => Some(edit),
        Ok(edit) => {
            tracing::warn!(
                cart_id,
                product_id,
                line_product_id = edit.line.product_id,
                "edit line belongs to another product; opening as new"
            );
            None
        }
        Err(e) => {
            tracing::warn!(cart_id, error = %e, "edit line unavailable; opening as new");
            None
        }
    }
}

async fn load_favorite(
    client: &BackendClient,
    user_id: Option<Uuid>,
    product_id: i64,
) -> FavoriteState {
    let Some(user_id) = user_id else {
        return FavoriteState::Idle;
    };
    match is_favorited(client, user_id, product_id).await {
        Ok(value) => FavoriteState::Settled(value),
        Err(e) => {
            tracing::warn!(product_id, error = %e, "favorite status unavailable");
            FavoriteState::Idle
        }
    }
}

async fn load_reviews(client: &BackendClient, product_id: i64) -> ReviewsPanel {
    match list_reviews(client, product_id).await {
        Ok(reviews) => {
            let summary = ReviewSummary::from_reviews(&reviews);
            ReviewsPanel::Loaded { reviews, summary }
        }
        Err(e) => {
            tracing::warn!(product_id, error = %e, "reviews unavailable");
            ReviewsPanel::Unavailable
        }
    }
}

async fn resolve_image(
    client: &BackendClient,
    product: &Product,
    request: &PageRequest<'_>,
) -> Option<String> {
    let key = product.image_url.as_deref()?;
    resolve_public_url(client, key, request.image_buckets, request.verify_images).await
}
