// src/report.rs
//! Turns merged entries into presentation-ready report rows.
//!
//! Every export path goes through the same sort so that CSV, JSON and the
//! terminal table always agree on row order.

use tracing::debug;

use crate::crypto;
use crate::types::{Environment, GeoReport, MergedMethodEntry, ReportRow};

/// Flatten merged entries into rows and apply the canonical ordering.
pub fn assemble(
    entries: &[MergedMethodEntry],
    display_order: &[String],
    fallback_currency: &str,
) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = entries
        .iter()
        .map(|entry| ReportRow {
            paymethod: entry.title.clone(),
            payment_name: join_lines(entry.payment_names.iter()),
            currency: entry
                .currency
                .clone()
                .unwrap_or_else(|| fallback_currency.to_string()),
            deposit: entry.deposit,
            withdraw: entry.withdraw,
            status: entry.status.status_label().to_string(),
            conditions: join_lines(entry.condition_tags.iter()),
            min_deposit: entry.min_deposit,
            recommended: entry.recommended,
            synthetic: entry.synthetic,
            placeholder: entry.is_placeholder(),
        })
        .collect();

    sort_rows(&mut rows, display_order);
    debug!("Assembled {} report rows", rows.len());
    rows
}

/// Assemble a complete per-GEO report.
pub fn build_report(
    project: &str,
    geo: &str,
    env: Environment,
    entries: &[MergedMethodEntry],
    display_order: &[String],
    fallback_currency: &str,
) -> GeoReport {
    GeoReport {
        project: project.to_string(),
        geo: geo.to_string(),
        env,
        rows: assemble(entries, display_order, fallback_currency),
        display_order: display_order.to_vec(),
    }
}

/// The one ordering every report shares.
///
/// Placeholder rows sink to the very bottom, withdraw-only rows below
/// deposit-capable ones. Within the deposit-capable body: regular methods
/// (recommended first, then display order, then title), then the pinned
/// Binance Pay / Jeton pair, then the crypto block in canonical ticker order.
pub fn sort_rows(rows: &mut [ReportRow], display_order: &[String]) {
    rows.sort_by(|a, b| sort_key(a, display_order).cmp(&sort_key(b, display_order)));
}

/// Binance Pay and Jeton sit between the regular body and the crypto block
const PINNED_TITLES: &[&str] = &["Binance Pay", "Jeton"];

fn sort_key(row: &ReportRow, display_order: &[String]) -> (bool, bool, u8, usize, bool, usize, String) {
    let title_lower = row.paymethod.to_lowercase();
    let withdraw_only = row.withdraw && !row.deposit;

    let section: u8 = if PINNED_TITLES.contains(&row.paymethod.as_str()) {
        1
    } else if crypto::is_crypto_title(&row.paymethod) {
        2
    } else {
        0
    };

    let crypto_rank = if section == 2 {
        crypto::crypto_index(&row.paymethod)
    } else {
        0
    };

    // Recommendation only reorders the regular body
    let not_recommended = section == 0 && !row.recommended;

    let display_idx = display_order
        .iter()
        .position(|t| t == &row.paymethod)
        .unwrap_or(usize::MAX);

    (
        row.placeholder,
        withdraw_only,
        section,
        crypto_rank,
        not_recommended,
        display_idx,
        title_lower,
    )
}

fn join_lines<'a>(parts: impl Iterator<Item = &'a String>) -> String {
    parts
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
