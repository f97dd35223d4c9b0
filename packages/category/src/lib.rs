#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Category registry. Loads every category definition from embedded TOML.
//!
//! Each `.toml` file in `packages/category/categories/` is baked into the
//! binary at compile time via [`include_str!`]. Supporting a new dimension
//! of the dataset is a matter of writing a TOML file and listing it below;
//! the transform pipeline itself is generic.

use emigrant_stats_category_models::{Category, CategoryDefinition};

pub use emigrant_stats_category_models as models;

/// TOML configs embedded at compile time.
const CATEGORY_TOMLS: &[(&str, &str)] = &[
    ("age", include_str!("../categories/age.toml")),
    ("sex", include_str!("../categories/sex.toml")),
    (
        "civil_status",
        include_str!("../categories/civil_status.toml"),
    ),
    ("education", include_str!("../categories/education.toml")),
    ("occupation", include_str!("../categories/occupation.toml")),
    (
        "major_destination",
        include_str!("../categories/major_destination.toml"),
    ),
    (
        "all_destination",
        include_str!("../categories/all_destination.toml"),
    ),
    ("region", include_str!("../categories/region.toml")),
    ("province", include_str!("../categories/province.toml")),
];

/// Parses a category definition from a TOML string.
///
/// # Errors
///
/// Returns the TOML deserialization error message if the config is
/// malformed.
pub fn parse_category_toml(toml_str: &str) -> Result<CategoryDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all category definitions in display order.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_categories() -> Vec<CategoryDefinition> {
    CATEGORY_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_category_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up the definition for a single category.
///
/// # Panics
///
/// Panics if the embedded configs do not cover `category`, which the
/// registry tests rule out.
#[must_use]
pub fn definition(category: Category) -> CategoryDefinition {
    all_categories()
        .into_iter()
        .find(|def| def.id == category)
        .unwrap_or_else(|| panic!("No category definition for {category}"))
}

/// Returns the definitions of categories covered by the forecasting
/// service.
#[must_use]
pub fn forecast_categories() -> Vec<CategoryDefinition> {
    let defs: Vec<CategoryDefinition> = all_categories()
        .into_iter()
        .filter(CategoryDefinition::is_forecast)
        .collect();
    log::debug!("{} forecastable categories", defs.len());
    defs
}
