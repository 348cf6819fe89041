//! Best Buy Products API response types.
//!
//! Only the fields requested through the `show=` projection are modelled.
//!
//! ### `sku`
//! Returned as a JSON integer (`6501234`). Some mirrors and fixtures send it
//! as a string, so both are accepted and stored as a string.
//!
//! ### `percentSavings`
//! Returned as a decimal *string* (`"24.24"`), unlike the other price fields
//! which are JSON numbers. `Decimal` deserializes from either form.
//!
//! ### `largeFrontImage` / `url`
//! May be `null` for marketplace listings.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Top-level response from `GET /v1/products(...)`.
///
/// Paging metadata is present but unused: a single page of the best deals
/// is all that is ever requested.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsSearchResponse {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    pub products: Vec<RawProduct>,
}

/// A single product entry as returned by the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(deserialize_with = "deserialize_sku")]
    pub sku: String,
    pub name: String,
    pub sale_price: Decimal,
    pub regular_price: Decimal,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub percent_savings: Option<Decimal>,
    #[serde(default)]
    pub dollar_savings: Option<Decimal>,
    #[serde(default)]
    pub large_front_image: Option<String>,
    /// Product detail page on the retailer site.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkuValue {
    Number(u64),
    Text(String),
}

fn deserialize_sku<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match SkuValue::deserialize(deserializer)? {
        SkuValue::Number(n) => n.to_string(),
        SkuValue::Text(s) => s,
    })
}
