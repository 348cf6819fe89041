use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A discounted product, normalized for storage under one storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Catalog SKU. Unique within a storage key's row set.
    pub sku: String,
    pub name: String,
    pub sale_price: Decimal,
    pub regular_price: Decimal,
    pub on_sale: bool,
    /// Percentage off the regular price, `0..=100`.
    pub percent_savings: Decimal,
    /// `regular_price - sale_price`, never negative.
    pub dollar_savings: Decimal,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
}

impl ProductRecord {
    /// Absolute discount, clamped at zero when the catalog reports a sale
    /// price above the regular price.
    #[must_use]
    pub fn dollar_savings_between(regular_price: Decimal, sale_price: Decimal) -> Decimal {
        (regular_price - sale_price).max(Decimal::ZERO)
    }
}

/// How the outbound "buy" link for a product is derived.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AffiliateLinkPolicy {
    /// Use the product detail URL returned by the catalog as-is.
    #[default]
    PassThrough,
    /// Build the link from a fixed affiliate base URL and the SKU.
    ///
    /// A `{sku}` placeholder in `base_url` is substituted; without one the
    /// SKU is appended.
    Compose { base_url: String },
}

impl AffiliateLinkPolicy {
    /// `Compose` when an affiliate base URL is configured, `PassThrough` otherwise.
    #[must_use]
    pub fn from_base_url(base_url: Option<&str>) -> Self {
        match base_url.map(str::trim).filter(|s| !s.is_empty()) {
            Some(base_url) => Self::Compose {
                base_url: base_url.to_string(),
            },
            None => Self::PassThrough,
        }
    }

    #[must_use]
    pub fn link_for(&self, sku: &str, detail_url: Option<&str>) -> Option<String> {
        match self {
            Self::PassThrough => detail_url
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(ToOwned::to_owned),
            Self::Compose { base_url } => {
                if base_url.contains("{sku}") {
                    Some(base_url.replace("{sku}", sku))
                } else {
                    Some(format!("{base_url}{sku}"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_savings_is_regular_minus_sale() {
        let savings =
            ProductRecord::dollar_savings_between(Decimal::new(32999, 2), Decimal::new(24999, 2));
        assert_eq!(savings, Decimal::new(8000, 2));
    }

    #[test]
    fn dollar_savings_never_negative() {
        let savings =
            ProductRecord::dollar_savings_between(Decimal::new(1000, 2), Decimal::new(1200, 2));
        assert_eq!(savings, Decimal::ZERO);
    }

    #[test]
    fn pass_through_uses_detail_url() {
        let policy = AffiliateLinkPolicy::PassThrough;
        assert_eq!(
            policy.link_for("6501234", Some("https://www.bestbuy.com/site/6501234.p")),
            Some("https://www.bestbuy.com/site/6501234.p".to_string())
        );
    }

    #[test]
    fn pass_through_without_url_is_absent() {
        let policy = AffiliateLinkPolicy::PassThrough;
        assert_eq!(policy.link_for("6501234", None), None);
        assert_eq!(policy.link_for("6501234", Some("  ")), None);
    }

    #[test]
    fn compose_substitutes_placeholder() {
        let policy = AffiliateLinkPolicy::Compose {
            base_url: "https://aff.example.com/click?sku={sku}&ref=deals".to_string(),
        };
        assert_eq!(
            policy.link_for("6501234", Some("https://ignored.example.com")),
            Some("https://aff.example.com/click?sku=6501234&ref=deals".to_string())
        );
    }

    #[test]
    fn compose_appends_sku_without_placeholder() {
        let policy = AffiliateLinkPolicy::Compose {
            base_url: "https://aff.example.com/p/".to_string(),
        };
        assert_eq!(
            policy.link_for("6501234", None),
            Some("https://aff.example.com/p/6501234".to_string())
        );
    }

    #[test]
    fn from_base_url_treats_blank_as_unset() {
        assert_eq!(
            AffiliateLinkPolicy::from_base_url(None),
            AffiliateLinkPolicy::PassThrough
        );
        assert_eq!(
            AffiliateLinkPolicy::from_base_url(Some("   ")),
            AffiliateLinkPolicy::PassThrough
        );
        assert!(matches!(
            AffiliateLinkPolicy::from_base_url(Some("https://aff.example.com/")),
            AffiliateLinkPolicy::Compose { .. }
        ));
    }

    #[test]
    fn product_record_serializes_decimals_as_strings() {
        let record = ProductRecord {
            sku: "6501234".to_string(),
            name: "Graphics Card".to_string(),
            sale_price: Decimal::new(24999, 2),
            regular_price: Decimal::new(32999, 2),
            on_sale: true,
            percent_savings: Decimal::new(2424, 2),
            dollar_savings: Decimal::new(8000, 2),
            image_url: None,
            affiliate_link: None,
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["sale_price"], "249.99");
        assert_eq!(json["on_sale"], true);
    }
}
