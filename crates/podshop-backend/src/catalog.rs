//! Catalog reads: products, variant groups, combinations, inventory.

use podshop_core::{
    group_variant_rows, InventoryRow, Product, ProductVariantCombination, ProductVariantValueRow,
    VariantGroup,
};

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::query::Query;

const PRODUCT_COLUMNS: &str = "id,name,starting_price,image_url,route,slug";
const VARIANT_ROW_SELECT: &str =
    "id,price,is_default,variant_values(id,value_name,variant_groups(id,name,input_type))";

/// Looks a product up by `route`, falling back to the `slug` column.
///
/// Returns `Ok(None)` when neither column matches. If the route lookup
/// fails but the slug lookup succeeds, the slug result is returned.
///
/// # Errors
///
/// Returns the slug lookup's [`BackendError`] when both lookups fail.
pub async fn find_product_by_slug(
    client: &BackendClient,
    slug: &str,
) -> Result<Option<Product>, BackendError> {
    let by_route = client
        .select::<Product>(
            "products",
            &Query::new().select(PRODUCT_COLUMNS).eq("route", slug).limit(1),
        )
        .await;

    match by_route {
        Ok(rows) if !rows.is_empty() => return Ok(rows.into_iter().next()),
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(slug, error = %e, "product lookup by route failed; trying slug");
        }
    }

    let by_slug = client
        .select::<Product>(
            "products",
            &Query::new().select(PRODUCT_COLUMNS).eq("slug", slug).limit(1),
        )
        .await
        .inspect_err(|e| tracing::error!(slug, error = %e, "product lookup by slug failed"))?;

    Ok(by_slug.into_iter().next())
}

/// Loads and groups the product's variant options.
///
/// # Errors
///
/// Returns [`BackendError`] if the backend request fails.
pub async fn load_variant_groups(
    client: &BackendClient,
    product_id: i64,
) -> Result<Vec<VariantGroup>, BackendError> {
    let rows: Vec<ProductVariantValueRow> = client
        .select(
            "product_variant_values",
            &Query::new()
                .select(VARIANT_ROW_SELECT)
                .eq("product_id", product_id)
                .order("id", true),
        )
        .await?;

    let groups = group_variant_rows(&rows);
    tracing::debug!(
        product_id,
        rows = rows.len(),
        groups = groups.len(),
        "loaded variant groups"
    );
    Ok(groups)
}

/// # Errors
///
/// Returns [`BackendError`] if the backend request fails.
pub async fn load_combinations(
    client: &BackendClient,
    product_id: i64,
) -> Result<Vec<ProductVariantCombination>, BackendError> {
    client
        .select(
            "product_variant_combinations",
            &Query::new()
                .select("id,product_id,variants")
                .eq("product_id", product_id)
                .order("id", true),
        )
        .await
}

/// Loads inventory rows for `combination_ids`, optionally filtered by
/// `status`. An empty id list reads nothing.
///
/// # Errors
///
/// Returns [`BackendError`] if the backend request fails.
pub async fn load_inventory(
    client: &BackendClient,
    combination_ids: &[i64],
    status: Option<&str>,
) -> Result<Vec<InventoryRow>, BackendError> {
    if combination_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = Query::new()
        .select("quantity,low_stock_limit,status,combination_id")
        .in_list("combination_id", combination_ids.iter().copied());
    if let Some(status) = status {
        query = query.eq("status", status);
    }
    query = query.order("combination_id", true);

    client.select("inventory", &query).await
}
