//! Concentration tiers for the destination choropleth.

use emigrant_stats_transform_models::{GeoBucket, GeoTier, RankedTotal};

/// Classifies a total into the first tier, from the top, whose threshold it
/// reaches. Lower bounds are inclusive; negative totals are [`GeoTier::Nil`].
#[must_use]
pub fn classify(total: i64) -> GeoTier {
    GeoTier::DESCENDING
        .into_iter()
        .find(|tier| total >= tier.threshold())
        .unwrap_or(GeoTier::Nil)
}

/// Builds the map bucket for one labeled total.
#[must_use]
pub fn bucket(label: &str, id: String, total: i64) -> GeoBucket {
    let tier = classify(total);
    GeoBucket {
        label: label.to_string(),
        id,
        total,
        tier,
        value: tier.ordinal(),
        color: tier.color().to_string(),
    }
}

/// Classifies every total, resolving each label to a map feature id with
/// `feature_id`.
pub fn classify_totals(
    totals: &[RankedTotal],
    feature_id: impl Fn(&str) -> String,
) -> Vec<GeoBucket> {
    totals
        .iter()
        .map(|t| bucket(&t.label, feature_id(&t.label), t.total))
        .collect()
}
