//! Destination country names to ISO3 codes.
//!
//! Names are matched after [`normalize_name`](crate::normalize_name), so
//! the table lists the uppercase spellings found in the destination
//! spreadsheets along with common variants.

use emigrant_stats_transform::choropleth::classify_totals;
use emigrant_stats_transform_models::{GeoBucket, RankedTotal};

use crate::normalize_name;

/// Maps a normalized country name to its ISO 3166-1 alpha-3 code.
#[must_use]
fn iso3_for_normalized(name: &str) -> Option<&'static str> {
    let code = match name {
        "UNITED STATES OF AMERICA" | "UNITED STATES" | "USA" | "U.S.A." => "USA",
        "CANADA" => "CAN",
        "JAPAN" => "JPN",
        "AUSTRALIA" => "AUS",
        "ITALY" => "ITA",
        "NEW ZEALAND" => "NZL",
        "UNITED KINGDOM" | "UNITED KINGDOM OF GREAT BRITAIN AND NORTHERN IRELAND" | "UK"
        | "GREAT BRITAIN" => "GBR",
        "GERMANY" | "FEDERAL REPUBLIC OF GERMANY" => "DEU",
        "SOUTH KOREA" | "KOREA, SOUTH" | "KOREA" | "REPUBLIC OF KOREA" => "KOR",
        "NORTH KOREA" | "KOREA, NORTH" => "PRK",
        "SPAIN" => "ESP",
        "FRANCE" => "FRA",
        "NETHERLANDS" | "THE NETHERLANDS" => "NLD",
        "BELGIUM" => "BEL",
        "SWITZERLAND" => "CHE",
        "AUSTRIA" => "AUT",
        "SWEDEN" => "SWE",
        "NORWAY" => "NOR",
        "DENMARK" => "DNK",
        "FINLAND" => "FIN",
        "ICELAND" => "ISL",
        "IRELAND" => "IRL",
        "PORTUGAL" => "PRT",
        "GREECE" => "GRC",
        "CYPRUS" => "CYP",
        "MALTA" => "MLT",
        "LUXEMBOURG" => "LUX",
        "POLAND" => "POL",
        "CZECH REPUBLIC" | "CZECHIA" => "CZE",
        "SLOVAKIA" => "SVK",
        "HUNGARY" => "HUN",
        "ROMANIA" => "ROU",
        "BULGARIA" => "BGR",
        "RUSSIA" | "RUSSIAN FEDERATION" => "RUS",
        "UKRAINE" => "UKR",
        "TURKEY" | "TURKIYE" => "TUR",
        "ISRAEL" => "ISR",
        "SAUDI ARABIA" => "SAU",
        "UNITED ARAB EMIRATES" | "UAE" => "ARE",
        "KUWAIT" => "KWT",
        "QATAR" => "QAT",
        "BAHRAIN" => "BHR",
        "OMAN" => "OMN",
        "JORDAN" => "JOR",
        "LEBANON" => "LBN",
        "IRAN" => "IRN",
        "IRAQ" => "IRQ",
        "EGYPT" => "EGY",
        "LIBYA" => "LBY",
        "NIGERIA" => "NGA",
        "SOUTH AFRICA" => "ZAF",
        "KENYA" => "KEN",
        "CHINA" | "PEOPLE'S REPUBLIC OF CHINA" => "CHN",
        "TAIWAN" => "TWN",
        "INDIA" => "IND",
        "PAKISTAN" => "PAK",
        "BANGLADESH" => "BGD",
        "SRI LANKA" => "LKA",
        "NEPAL" => "NPL",
        "INDONESIA" => "IDN",
        "MALAYSIA" => "MYS",
        "SINGAPORE" => "SGP",
        "THAILAND" => "THA",
        "VIETNAM" | "VIET NAM" => "VNM",
        "CAMBODIA" => "KHM",
        "LAOS" => "LAO",
        "MYANMAR" | "BURMA" => "MMR",
        "BRUNEI" | "BRUNEI DARUSSALAM" => "BRN",
        "PAPUA NEW GUINEA" => "PNG",
        "FIJI" => "FJI",
        "MEXICO" => "MEX",
        "BRAZIL" => "BRA",
        "ARGENTINA" => "ARG",
        "CHILE" => "CHL",
        "PERU" => "PER",
        "COLOMBIA" => "COL",
        "VENEZUELA" => "VEN",
        "PANAMA" => "PAN",
        "COSTA RICA" => "CRI",
        "CUBA" => "CUB",
        "JAMAICA" => "JAM",
        "DOMINICAN REPUBLIC" => "DOM",
        "PUERTO RICO" => "PRI",
        "PHILIPPINES" => "PHL",
        _ => return None,
    };
    Some(code)
}

/// Looks up the ISO3 code of a destination country as written in the
/// source data.
#[must_use]
pub fn to_iso3(country: &str) -> Option<&'static str> {
    iso3_for_normalized(&normalize_name(country))
}

/// Map feature id for `country`: its ISO3 code, or the raw name when the
/// country is not in the table.
#[must_use]
pub fn feature_id(country: &str) -> String {
    to_iso3(country).map_or_else(
        || {
            log::debug!("No ISO3 code for \"{country}\"");
            country.to_string()
        },
        ToString::to_string,
    )
}

/// Classifies country totals for the destination choropleth.
#[must_use]
pub fn country_buckets(totals: &[RankedTotal]) -> Vec<GeoBucket> {
    classify_totals(totals, feature_id)
}

#[cfg(test)]
mod tests {
    use emigrant_stats_transform_models::GeoTier;

    use super::*;

    #[test]
    fn maps_spreadsheet_spellings() {
        assert_eq!(to_iso3("UNITED STATES OF AMERICA"), Some("USA"));
        assert_eq!(to_iso3("Canada"), Some("CAN"));
        assert_eq!(to_iso3("  korea, south "), Some("KOR"));
        assert_eq!(to_iso3("United Kingdom (UK)"), Some("GBR"));
    }

    #[test]
    fn unknown_country_falls_back_to_raw_name() {
        assert_eq!(to_iso3("ATLANTIS"), None);
        assert_eq!(feature_id("ATLANTIS"), "ATLANTIS");
        assert_eq!(feature_id("JAPAN"), "JPN");
    }

    #[test]
    fn buckets_use_iso3_ids() {
        let buckets = country_buckets(&[RankedTotal {
            label: "UNITED STATES OF AMERICA".to_string(),
            total: 1_200_000,
        }]);
        assert_eq!(buckets[0].id, "USA");
        assert_eq!(buckets[0].label, "UNITED STATES OF AMERICA");
        assert_eq!(buckets[0].tier, GeoTier::Extreme);
    }
}
