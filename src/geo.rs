// src/geo.rs
//! Country-code normalization and the forbidden-GEO predicate.
//!
//! GEO keys look like "DE", "PL_PLN" or occasionally a spelled-out country
//! name. Everything is reduced to an ISO 3166-1 alpha-2 code before checking
//! it against the regulatory exclusion set and the FATF blacklist.

/// Countries a geo-restricted site must never be queried for
pub const FORBIDDEN_GEO_CODES: &[&str] = &[
    "AU", // Australia
    "AT", // Austria
    "KM", // Comoros
    "FR", // France
    "DE", // Germany
    "NL", // Netherlands
    "ES", // Spain
    "GB", // United Kingdom
    "US", // USA
    "GR", // Greece
    "HU", // Hungary
];

/// FATF blacklist
pub const FATF_BLACKLIST_CODES: &[&str] = &["KP", "IR", "MM"];

/// Reduce a GEO key or country name to a two-letter code.
///
/// "PL_PLN" -> "PL", "uk" -> "GB", "United Kingdom" -> "GB", "USA" -> "US".
/// Unknown names are upper-cased and returned as-is.
pub fn normalize_country_code(geo: &str) -> String {
    let head = geo.split('_').next().unwrap_or(geo).trim();
    if head.is_empty() {
        return String::new();
    }

    if head.len() <= 3 {
        let code = head.to_ascii_uppercase();
        return match code.as_str() {
            "UK" => "GB".to_string(),
            "USA" => "US".to_string(),
            _ => code,
        };
    }

    match head.to_ascii_lowercase().as_str() {
        "greece" => "GR".to_string(),
        "australia" => "AU".to_string(),
        "austria" => "AT".to_string(),
        "comoros" => "KM".to_string(),
        "france" => "FR".to_string(),
        "germany" => "DE".to_string(),
        "netherlands" => "NL".to_string(),
        "spain" => "ES".to_string(),
        "united kingdom" | "great britain" => "GB".to_string(),
        "united states" | "united states of america" => "US".to_string(),
        "hungary" => "HU".to_string(),
        _ => head.to_ascii_uppercase(),
    }
}

/// Whether a geo-restricted site must skip this GEO without any network call
pub fn is_forbidden(geo: &str) -> bool {
    let code = normalize_country_code(geo);
    if code.is_empty() {
        return false;
    }
    FORBIDDEN_GEO_CODES.contains(&code.as_str()) || FATF_BLACKLIST_CODES.contains(&code.as_str())
}

/// Country component of a GEO key: "PL_PLN" -> "PL"
pub fn country_of(geo: &str) -> &str {
    geo.split('_').next().unwrap_or(geo)
}
