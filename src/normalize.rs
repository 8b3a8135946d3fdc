// src/normalize.rs
//! Converts a site's raw payment-method records into `NormalizedMethod`s.
//!
//! Upstream catalogs rename and move fields between sites and releases, so
//! every field is resolved through an ordered accessor chain: the first
//! location that yields a value wins. Items missing both a usable title and
//! name are skipped; duplicate (title, name) pairs within one call are
//! dropped.

use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::types::{MinSource, NormalizedMethod};

/// Title resolution chain: explicit title, then alias, then name
const TITLE_CHAIN: &[&[&str]] = &[&["title"], &["alias"], &["name"]];

/// Name resolution chain: explicit name, nested paymethod name/code, doc id
const NAME_CHAIN: &[&[&str]] = &[
    &["name"],
    &["paymethods", "paymethod", "name"],
    &["paymethods", "paymethod", "code"],
    &["doc_id"],
];

pub struct NormalizeResult {
    pub methods: Vec<NormalizedMethod>,
    /// Currency resolved for the session if it was not already known
    pub currency: Option<String>,
    /// (title, name) pairs the upstream recommends for the queried country
    pub recommended: HashSet<(String, String)>,
}

/// Normalize one catalog response's items for a given country.
pub fn normalize_items(
    items: &[Value],
    country: &str,
    session_currency: Option<&str>,
) -> NormalizeResult {
    let mut methods = Vec::new();
    let mut recommended = HashSet::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut currency: Option<String> = session_currency.map(str::to_string);

    for item in items {
        let Some(title) = first_string(item, TITLE_CHAIN) else {
            debug!("Skipping catalog item without a resolvable title");
            continue;
        };
        let Some(name) = first_string(item, NAME_CHAIN) else {
            debug!("Skipping catalog item '{}' without a resolvable name", title);
            continue;
        };

        let key = (title.clone(), name.clone());
        if !seen.insert(key.clone()) {
            debug!("Dropping duplicate method ({}, {})", title, name);
            continue;
        }

        let item_cur = item_currency(item);
        if currency.is_none() && item_cur.is_some() {
            currency = item_cur.clone();
        }

        if is_recommended(item, country) {
            recommended.insert(key);
        }

        let (min_deposit, min_source) = compute_min_deposit(item);

        methods.push(NormalizedMethod {
            title,
            name,
            min_deposit,
            currency: item_cur.or_else(|| currency.clone()),
            min_source,
            recommended: false, // stamped by the extractor from the recommended set
            synthetic: false,
            crypto_parent: string_at(item, &["parent_paysystem"]).as_deref() == Some("Crypto"),
            deposit: false,
            withdraw: false,
        });
    }

    NormalizeResult {
        methods,
        currency,
        recommended,
    }
}

/// Resolve the minimum deposit for one raw item.
///
/// Priority is a business rule and must hold exactly: the dedicated
/// min-deposit-flow field, then the generic min, then the lowest value of a
/// comma-separated range, then the default amount.
pub fn compute_min_deposit(item: &Value) -> (Option<f64>, MinSource) {
    const FLOW_PATHS: &[&[&str]] = &[&["min_dep_flow"], &["paymethods", "min_dep_flow"]];
    const MIN_PATHS: &[&[&str]] = &[&["min"], &["paymethods", "min"], &["paymethod", "min"]];
    const RANGE_PATHS: &[&[&str]] = &[&["range"], &["paymethods", "range"]];
    const DEFAULT_PATHS: &[&[&str]] = &[&["default"], &["paymethods", "default"]];

    if let Some(v) = first_amount(item, FLOW_PATHS) {
        return (Some(v), MinSource::MinDepFlow);
    }
    if let Some(v) = first_amount(item, MIN_PATHS) {
        return (Some(v), MinSource::Min);
    }
    for path in RANGE_PATHS {
        if let Some(v) = range_minimum(value_at(item, path)) {
            return (Some(v), MinSource::Range);
        }
    }
    if let Some(v) = first_amount(item, DEFAULT_PATHS) {
        return (Some(v), MinSource::Default);
    }

    (None, MinSource::None)
}

/// Recommendation rule: the nested recomended block must carry status=true and
/// either an empty country allowlist or a case-insensitive match for the
/// queried country. No title is special-cased; "Crypto" passes or fails this
/// same check like everything else.
fn is_recommended(item: &Value, country: &str) -> bool {
    let rec = &item["paymethods"]["recomended"];
    if !rec["status"].as_bool().unwrap_or(false) {
        return false;
    }
    match rec["countries"].as_array() {
        None => true,
        Some(countries) if countries.is_empty() => true,
        Some(countries) => countries
            .iter()
            .filter_map(Value::as_str)
            .any(|c| c.eq_ignore_ascii_case(country)),
    }
}

fn item_currency(item: &Value) -> Option<String> {
    string_at(item, &["paymethods", "currency", "code"])
        .or_else(|| string_at(item, &["paymethods", "currency", "currency"]))
}

fn first_string(item: &Value, chains: &[&[&str]]) -> Option<String> {
    chains.iter().find_map(|path| string_at(item, path))
}

fn first_amount(item: &Value, paths: &[&[&str]]) -> Option<f64> {
    paths
        .iter()
        .find_map(|path| amount_of(value_at(item, path)))
}

fn value_at<'a>(item: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = item;
    for seg in path {
        cur = cur.get(seg)?;
    }
    Some(cur)
}

fn string_at(item: &Value, path: &[&str]) -> Option<String> {
    let s = value_at(item, path)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Numbers pass through; strings are trimmed and accept a decimal comma.
/// Negative amounts are treated as absent.
fn amount_of(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.replace(',', ".").parse::<f64>().ok()
            }
        }
        _ => None,
    }?;
    (parsed >= 0.0).then_some(parsed)
}

/// Lowest value of a comma-separated range field like "20, 50, 100"
fn range_minimum(value: Option<&Value>) -> Option<f64> {
    let raw = value?.as_str()?;
    raw.split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                None
            } else {
                part.parse::<f64>().ok()
            }
        })
        .filter(|v| *v >= 0.0)
        .fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.min(v)))
        })
}
