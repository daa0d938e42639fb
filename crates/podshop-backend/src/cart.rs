//! Adding, editing and removing cart lines.
//!
//! A cart line is a `cart` row plus one `cart_variants` row per selected
//! option. The backend offers no multi-table transaction, so a failed
//! variant insert is compensated: a new line is deleted again, and an edited
//! line gets its previous variant rows back.

use std::collections::BTreeSet;

use podshop_core::{
    total_price, CartLine, CartVariant, Product, Quantity, Selection, VariantGroup,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::query::Query;
use crate::uploads::link_uploads_to_cart;

pub const ALREADY_IN_CART_MESSAGE: &str =
    "This item with the selected options is already in your cart.";

const CART_COLUMNS: &str = "cart_id,user_id,product_id,quantity,base_price,total_price,route,slug";
const CART_VARIANT_COLUMNS: &str = "cart_id,user_id,cartvariant_id,price";

/// An "add to cart" (or "save changes" in edit mode) request.
#[derive(Debug, Clone, Copy)]
pub struct AddToCart<'a> {
    /// `None` when nobody is signed in.
    pub user_id: Option<Uuid>,
    pub product: &'a Product,
    pub groups: &'a [VariantGroup],
    pub selection: &'a Selection,
    pub quantity: Quantity,
    /// Starting price plus the selected deltas.
    pub unit_price: Decimal,
    /// Set when editing an existing line.
    pub edit_cart_id: Option<i64>,
    /// `uploaded_files` ids to attach to the resulting line.
    pub pending_uploads: &'a [i64],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome {
    Inserted { cart_id: i64 },
    Merged { cart_id: i64, quantity: Quantity },
    Updated { cart_id: i64 },
}

impl CartOutcome {
    #[must_use]
    pub fn cart_id(&self) -> i64 {
        match self {
            CartOutcome::Inserted { cart_id }
            | CartOutcome::Merged { cart_id, .. }
            | CartOutcome::Updated { cart_id } => *cart_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("sign-in required")]
    AuthRequired,

    #[error("not every variant group has a selection")]
    IncompleteSelection,

    #[error("cart line {0} not found")]
    LineNotFound(i64),

    #[error("item with the selected options is already in the cart")]
    AlreadyInCart(#[source] BackendError),

    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for CartError {
    fn from(e: BackendError) -> Self {
        if e.is_unique_violation() {
            CartError::AlreadyInCart(e)
        } else {
            CartError::Backend(e)
        }
    }
}

impl CartError {
    /// Text shown to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CartError::AuthRequired => "Please sign in to add items to your cart.".to_owned(),
            CartError::IncompleteSelection => {
                "Please choose an option for every variant.".to_owned()
            }
            CartError::LineNotFound(_) => "This cart item no longer exists.".to_owned(),
            CartError::AlreadyInCart(_) => ALREADY_IN_CART_MESSAGE.to_owned(),
            CartError::Backend(e) => e.raw_message(),
        }
    }
}

/// A cart line loaded for editing, with its selected variant ids.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableCartLine {
    pub line: CartLine,
    /// `cart_variants.cartvariant_id` values, in row order.
    pub variant_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct NewCartLine<'a> {
    user_id: Uuid,
    product_id: i64,
    quantity: u32,
    base_price: Decimal,
    total_price: Decimal,
    route: Option<&'a str>,
    slug: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LinePatch {
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_price: Option<Decimal>,
    total_price: Decimal,
}

/// Adds the selection to the cart, merges it into a matching line, or
/// rewrites the line being edited.
///
/// Pending uploads are linked to the resulting line afterwards; a failed
/// link is logged and does not fail the call.
///
/// # Errors
///
/// - [`CartError::AuthRequired`] without a signed-in user.
/// - [`CartError::IncompleteSelection`] if a group has no selection.
/// - [`CartError::LineNotFound`] if the edited line is gone.
/// - [`CartError::AlreadyInCart`] on a unique violation.
/// - [`CartError::Backend`] for any other backend failure.
pub async fn upsert_cart_line(
    client: &BackendClient,
    request: &AddToCart<'_>,
) -> Result<CartOutcome, CartError> {
    let user_id = request.user_id.ok_or(CartError::AuthRequired)?;
    if !request.selection.is_complete(request.groups) {
        return Err(CartError::IncompleteSelection);
    }

    let outcome = if let Some(cart_id) = request.edit_cart_id {
        update_line(client, user_id, cart_id, request).await?
    } else {
        let selected = request.selection.variant_id_set();
        match find_existing_line(client, user_id, request.product.id, &selected).await? {
            Some(line) => merge_into_line(client, user_id, &line, request).await?,
            None => insert_line(client, user_id, request).await?,
        }
    };

    let cart_id = outcome.cart_id();
    if let Err(e) = link_uploads_to_cart(client, request.pending_uploads, cart_id).await {
        tracing::warn!(cart_id, error = %e, "failed to link uploads to cart line");
    }

    tracing::info!(
        %user_id,
        product_id = request.product.id,
        ?outcome,
        "cart line saved"
    );
    Ok(outcome)
}

/// Returns the first line whose variant set equals `selected`, ignoring order.
#[must_use]
pub fn find_matching_line<'a>(
    lines: &'a [CartLine],
    variants: &[CartVariant],
    selected: &BTreeSet<i64>,
) -> Option<&'a CartLine> {
    lines.iter().find(|line| {
        let ids: BTreeSet<i64> = variants
            .iter()
            .filter(|v| v.cart_id == line.cart_id)
            .map(|v| v.cartvariant_id)
            .collect();
        ids == *selected
    })
}

/// Loads a line and its variant ids for edit mode.
///
/// # Errors
///
/// Returns [`CartError::LineNotFound`] if the line does not belong to
/// `user_id`, or [`CartError::Backend`] if a request fails.
pub async fn load_cart_line_for_edit(
    client: &BackendClient,
    cart_id: i64,
    user_id: Uuid,
) -> Result<EditableCartLine, CartError> {
    let lines: Vec<CartLine> = client
        .select(
            "cart",
            &Query::new()
                .select(CART_COLUMNS)
                .eq("cart_id", cart_id)
                .eq("user_id", user_id)
                .limit(1),
        )
        .await?;
    let line = lines
        .into_iter()
        .next()
        .ok_or(CartError::LineNotFound(cart_id))?;

    let variants: Vec<CartVariant> = client
        .select(
            "cart_variants",
            &Query::new()
                .select(CART_VARIANT_COLUMNS)
                .eq("cart_id", cart_id),
        )
        .await?;

    Ok(EditableCartLine {
        line,
        variant_ids: variants.iter().map(|v| v.cartvariant_id).collect(),
    })
}

/// Deletes a line's variants and then the line.
///
/// # Errors
///
/// Returns [`CartError::Backend`] if either delete fails.
pub async fn remove_cart_line(
    client: &BackendClient,
    cart_id: i64,
    user_id: Uuid,
) -> Result<(), CartError> {
    client
        .delete(
            "cart_variants",
            &Query::new().eq("cart_id", cart_id).eq("user_id", user_id),
        )
        .await?;
    client
        .delete(
            "cart",
            &Query::new().eq("cart_id", cart_id).eq("user_id", user_id),
        )
        .await?;
    tracing::info!(cart_id, %user_id, "cart line removed");
    Ok(())
}

async fn find_existing_line(
    client: &BackendClient,
    user_id: Uuid,
    product_id: i64,
    selected: &BTreeSet<i64>,
) -> Result<Option<CartLine>, BackendError> {
    let lines: Vec<CartLine> = client
        .select(
            "cart",
            &Query::new()
                .select(CART_COLUMNS)
                .eq("user_id", user_id)
                .eq("product_id", product_id)
                .order("cart_id", true),
        )
        .await?;
    if lines.is_empty() {
        return Ok(None);
    }

    let variants: Vec<CartVariant> = client
        .select(
            "cart_variants",
            &Query::new()
                .select(CART_VARIANT_COLUMNS)
                .in_list("cart_id", lines.iter().map(|l| l.cart_id)),
        )
        .await?;

    Ok(find_matching_line(&lines, &variants, selected).cloned())
}

async fn merge_into_line(
    client: &BackendClient,
    user_id: Uuid,
    line: &CartLine,
    request: &AddToCart<'_>,
) -> Result<CartOutcome, CartError> {
    let quantity = Quantity::new(line.quantity).merge(request.quantity);
    let patch = LinePatch {
        quantity: quantity.get(),
        base_price: None,
        total_price: total_price(request.unit_price, quantity),
    };
    let updated: Vec<CartLine> = client
        .update(
            "cart",
            &Query::new()
                .eq("cart_id", line.cart_id)
                .eq("user_id", user_id),
            &patch,
        )
        .await?;
    if updated.is_empty() {
        return Err(CartError::LineNotFound(line.cart_id));
    }
    Ok(CartOutcome::Merged {
        cart_id: line.cart_id,
        quantity,
    })
}

async fn insert_line(
    client: &BackendClient,
    user_id: Uuid,
    request: &AddToCart<'_>,
) -> Result<CartOutcome, CartError> {
    let new_line = NewCartLine {
        user_id,
        product_id: request.product.id,
        quantity: request.quantity.get(),
        base_price: request.unit_price,
        total_price: total_price(request.unit_price, request.quantity),
        route: request.product.route.as_deref(),
        slug: request.product.slug.as_deref(),
    };
    let inserted: Vec<CartLine> = client.insert("cart", &new_line).await?;
    let cart_id = inserted
        .first()
        .map(|l| l.cart_id)
        .ok_or_else(|| BackendError::EmptyResponse {
            context: "insert into cart".to_owned(),
        })?;

    if let Err(e) = insert_variants(client, user_id, cart_id, request.selection).await {
        if let Err(cleanup) = client
            .delete("cart", &Query::new().eq("cart_id", cart_id))
            .await
        {
            tracing::error!(
                cart_id,
                error = %cleanup,
                "failed to remove cart line after variant insert failure"
            );
        }
        return Err(e.into());
    }

    Ok(CartOutcome::Inserted { cart_id })
}

async fn update_line(
    client: &BackendClient,
    user_id: Uuid,
    cart_id: i64,
    request: &AddToCart<'_>,
) -> Result<CartOutcome, CartError> {
    let patch = LinePatch {
        quantity: request.quantity.get(),
        base_price: Some(request.unit_price),
        total_price: total_price(request.unit_price, request.quantity),
    };
    let updated: Vec<CartLine> = client
        .update(
            "cart",
            &Query::new()
                .eq("cart_id", cart_id)
                .eq("user_id", user_id)
                .eq("product_id", request.product.id),
            &patch,
        )
        .await?;
    if updated.is_empty() {
        return Err(CartError::LineNotFound(cart_id));
    }

    let variant_filter = Query::new().eq("cart_id", cart_id).eq("user_id", user_id);
    let previous: Vec<CartVariant> = client
        .select(
            "cart_variants",
            &variant_filter.clone().select(CART_VARIANT_COLUMNS),
        )
        .await?;
    client.delete("cart_variants", &variant_filter).await?;

    if let Err(e) = insert_variants(client, user_id, cart_id, request.selection).await {
        if !previous.is_empty() {
            if let Err(restore) = client.insert_minimal("cart_variants", &previous).await {
                tracing::error!(
                    cart_id,
                    error = %restore,
                    "failed to restore cart variants after variant insert failure"
                );
            }
        }
        return Err(e.into());
    }

    Ok(CartOutcome::Updated { cart_id })
}

async fn insert_variants(
    client: &BackendClient,
    user_id: Uuid,
    cart_id: i64,
    selection: &Selection,
) -> Result<(), BackendError> {
    let rows: Vec<CartVariant> = selection
        .iter()
        .map(|(_, selected)| CartVariant {
            cart_id,
            user_id,
            cartvariant_id: selected.value_id,
            price: Some(selected.price),
        })
        .collect();
    if rows.is_empty() {
        return Ok(());
    }
    client.insert_minimal("cart_variants", &rows).await
}
