//! Normalization of catalog product entries into [`ProductRecord`]s ready
//! for storage.

use dealsdb_core::{AffiliateLinkPolicy, ProductRecord};
use rust_decimal::Decimal;

use crate::error::CatalogError;
use crate::types::RawProduct;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Converts a [`RawProduct`] into a [`ProductRecord`].
///
/// - `largeFrontImage` becomes `image_url`.
/// - `affiliate_link` comes from `policy`, using the catalog `url` as the
///   detail page for pass-through.
/// - `dollar_savings` is always derived from the two prices and never
///   negative, whatever the catalog reported.
/// - `percent_savings` is taken from the catalog when present, otherwise
///   derived from the prices, and clamped to `0..=100`.
///
/// # Errors
///
/// Returns [`CatalogError::Normalization`] if the sku or name is blank or a
/// price is negative.
pub fn normalize_product(
    raw: RawProduct,
    policy: &AffiliateLinkPolicy,
) -> Result<ProductRecord, CatalogError> {
    let sku = raw.sku.trim().to_string();
    if sku.is_empty() {
        return Err(CatalogError::Normalization {
            sku: raw.sku,
            reason: "sku is empty".to_string(),
        });
    }

    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return Err(CatalogError::Normalization {
            sku,
            reason: "name is empty".to_string(),
        });
    }

    if raw.sale_price.is_sign_negative() || raw.regular_price.is_sign_negative() {
        return Err(CatalogError::Normalization {
            sku,
            reason: format!(
                "negative price (sale {}, regular {})",
                raw.sale_price, raw.regular_price
            ),
        });
    }

    let percent_savings = raw
        .percent_savings
        .unwrap_or_else(|| percent_off(raw.regular_price, raw.sale_price))
        .round_dp(2)
        .clamp(Decimal::ZERO, ONE_HUNDRED);
    let dollar_savings = ProductRecord::dollar_savings_between(raw.regular_price, raw.sale_price);
    let affiliate_link = policy.link_for(&sku, raw.url.as_deref());
    let image_url = raw
        .large_front_image
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    Ok(ProductRecord {
        sku,
        name,
        sale_price: raw.sale_price,
        regular_price: raw.regular_price,
        on_sale: raw.on_sale,
        percent_savings,
        dollar_savings,
        image_url,
        affiliate_link,
    })
}

/// Normalizes a whole catalog page, failing on the first bad entry.
///
/// # Errors
///
/// Returns the first [`CatalogError::Normalization`] encountered.
pub fn normalize_products(
    raw: Vec<RawProduct>,
    policy: &AffiliateLinkPolicy,
) -> Result<Vec<ProductRecord>, CatalogError> {
    raw.into_iter()
        .map(|p| normalize_product(p, policy))
        .collect()
}

fn percent_off(regular_price: Decimal, sale_price: Decimal) -> Decimal {
    if regular_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (regular_price - sale_price) / regular_price * ONE_HUNDRED
}
