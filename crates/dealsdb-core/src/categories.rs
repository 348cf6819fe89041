//! Category registry: the static two-level tree mapping catalog category
//! filters to the storage keys their listings are persisted under.
//!
//! The registry is loaded once at startup from `config/categories.yaml`,
//! validated, and then shared read-only (behind an `Arc`) by the scheduler,
//! the query surface, and the manual trigger.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One category or subcategory feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Filter expression passed verbatim to the catalog API, e.g.
    /// `"abcat0507010"` or `"abcat0507010&search=AMD"`.
    #[serde(rename = "external_id")]
    pub external_category_id: String,
    /// Identifier of the row set holding this feed's current listing.
    pub storage_key: String,
    /// Subcategories. Always empty on a child node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    #[must_use]
    pub fn new(external_category_id: impl Into<String>, storage_key: impl Into<String>) -> Self {
        Self {
            external_category_id: external_category_id.into(),
            storage_key: storage_key.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<CategoryNode>) -> Self {
        self.children = children;
        self
    }
}

/// Validated, immutable category tree.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    roots: Vec<CategoryNode>,
}

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    categories: Vec<CategoryNode>,
}

impl CategoryRegistry {
    /// Build a registry from root nodes, enforcing the tree invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if a storage key is duplicated
    /// anywhere in the tree, is not a lowercase identifier, if an external
    /// id is empty or contains URL delimiters, or if a child node has
    /// children of its own.
    pub fn from_nodes(roots: Vec<CategoryNode>) -> Result<Self, ConfigError> {
        validate_nodes(&roots)?;
        Ok(Self { roots })
    }

    /// Find the node (root or child) whose storage key matches.
    ///
    /// Only roots and their direct children are searched; the tree is never
    /// deeper than that.
    #[must_use]
    pub fn resolve(&self, storage_key: &str) -> Option<&CategoryNode> {
        for root in &self.roots {
            if root.storage_key == storage_key {
                return Some(root);
            }
            if let Some(child) = root
                .children
                .iter()
                .find(|child| child.storage_key == storage_key)
            {
                return Some(child);
            }
        }
        None
    }

    #[must_use]
    pub fn contains(&self, storage_key: &str) -> bool {
        self.resolve(storage_key).is_some()
    }

    #[must_use]
    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Every node in declaration order: each root followed by its children.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &CategoryNode> {
        self.roots
            .iter()
            .flat_map(|root| std::iter::once(root).chain(root.children.iter()))
    }

    #[must_use]
    pub fn root_storage_keys(&self) -> Vec<&str> {
        self.roots.iter().map(|r| r.storage_key.as_str()).collect()
    }

    /// Total number of nodes, children included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.iter().map(|r| 1 + r.children.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Load and validate the category registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoryRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_categories(&content)
}

/// Parse and validate a registry from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_categories(yaml: &str) -> Result<CategoryRegistry, ConfigError> {
    let file: CategoriesFile = serde_yaml::from_str(yaml)?;
    CategoryRegistry::from_nodes(file.categories)
}

fn validate_nodes(roots: &[CategoryNode]) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for root in roots {
        validate_node(root, &mut seen_keys)?;

        for child in &root.children {
            if !child.children.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "category '{}' is nested more than two levels deep",
                    child.storage_key
                )));
            }
            validate_node(child, &mut seen_keys)?;
        }
    }

    Ok(())
}

fn validate_node<'a>(
    node: &'a CategoryNode,
    seen_keys: &mut HashSet<&'a str>,
) -> Result<(), ConfigError> {
    if !is_storage_identifier(&node.storage_key) {
        return Err(ConfigError::Validation(format!(
            "storage key '{}' must be non-empty and contain only [a-z0-9_]",
            node.storage_key
        )));
    }

    if !is_filter_expression(&node.external_category_id) {
        return Err(ConfigError::Validation(format!(
            "external id '{}' for '{}' is empty or contains reserved characters",
            node.external_category_id, node.storage_key
        )));
    }

    if !seen_keys.insert(node.storage_key.as_str()) {
        return Err(ConfigError::Validation(format!(
            "duplicate storage key: '{}'",
            node.storage_key
        )));
    }

    Ok(())
}

fn is_storage_identifier(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// The id is spliced into the request path inside `products(...)`.
fn is_filter_expression(id: &str) -> bool {
    !id.trim().is_empty()
        && !id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '/' | '(' | ')'))
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
