//! `variants` command: the grouped variant catalog for one product.

use podshop_backend::{find_product_by_slug, load_variant_groups, BackendClient};
use podshop_core::{InputType, VariantGroup};

use crate::stock::LookupError;

/// # Errors
///
/// - [`LookupError::NotFound`] when no product matches `slug`.
/// - [`LookupError::Unexpected`] when a backend request fails.
pub(crate) async fn run_variants(client: &BackendClient, slug: &str) -> Result<(), LookupError> {
    let product = find_product_by_slug(client, slug)
        .await
        .map_err(|e| LookupError::Unexpected(e.into()))?
        .ok_or_else(|| LookupError::NotFound(slug.to_string()))?;

    let groups = load_variant_groups(client, product.id)
        .await
        .map_err(|e| LookupError::Unexpected(e.into()))?;

    println!(
        "product {} \"{}\" starting at {}",
        product.id, product.name, product.starting_price
    );
    if groups.is_empty() {
        println!("no variant groups");
    }
    for group in &groups {
        print!("{}", render_group(group));
    }
    Ok(())
}

fn render_group(group: &VariantGroup) -> String {
    let kind = match group.input_type {
        InputType::Radio => "radio",
        InputType::Color => "color",
    };
    let default_id = group.default_option().map(|o| o.id);

    let mut out = format!("{} [{kind}] (group {})\n", group.name, group.id);
    for option in &group.values {
        let marker = if Some(option.id) == default_id { "*" } else { " " };
        out.push_str(&format!(
            "  {marker} #{:<6} {:<16} +{}\n",
            option.id, option.name, option.price
        ));
    }
    out
}
