//! Client for the Best Buy Products API and normalization of its product
//! entries into [`dealsdb_core::ProductRecord`]s.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::{CatalogClient, PAGE_SIZE, SHOW_FIELDS, SORT_ORDER};
pub use error::CatalogError;
pub use normalize::{normalize_product, normalize_products};
pub use types::{ProductsSearchResponse, RawProduct};
