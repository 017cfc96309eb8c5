//! Categories and subcategories.

use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, SubcategoryId};

/// Top-level listing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// Subcategory belonging to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    /// Subcategory id.
    pub id: SubcategoryId,
    /// Display name.
    pub name: String,
    /// Parent category.
    #[serde(alias = "category")]
    pub category_id: CategoryId,
}
