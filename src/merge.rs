// src/merge.rs
//! Folds per-account catalogs into one entry per payment-method title.
//!
//! The fold is a pure union: capability flags OR together, variant names and
//! condition tags accumulate into sets, and the minimum deposit takes the
//! floor across accounts. Running the fold twice over the same contributions
//! yields identical entries.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::types::{Environment, MergedMethodEntry, NormalizedMethod};

/// What one test account contributed to a GEO
#[derive(Debug, Clone)]
pub struct AccountContribution {
    pub login: String,
    pub methods: Vec<NormalizedMethod>,
}

/// Merge every account's methods into per-title entries.
///
/// `preferred_order` seeds the output: its titles come first, and a preferred
/// title no account reported survives as a placeholder entry. Titles outside
/// the preferred order follow in first-seen order.
pub fn merge_accounts(
    contributions: &[AccountContribution],
    preferred_order: &[String],
    recommended: &HashSet<(String, String)>,
    condition_overrides: &BTreeMap<String, String>,
    env: Environment,
) -> Vec<MergedMethodEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, MergedMethodEntry> = HashMap::new();

    for title in preferred_order {
        if !entries.contains_key(title) {
            order.push(title.clone());
            entries.insert(title.clone(), empty_entry(title, env));
        }
    }

    for contribution in contributions {
        for method in &contribution.methods {
            let entry = entries.entry(method.title.clone()).or_insert_with(|| {
                order.push(method.title.clone());
                empty_entry(&method.title, env)
            });

            entry.payment_names.insert(method.name.clone());
            entry.deposit |= method.deposit;
            entry.withdraw |= method.withdraw;
            entry.synthetic |= method.synthetic;
            entry.recommended |= method.recommended || recommended.contains(&method.key());

            if let Some(min) = method.min_deposit {
                entry.min_deposit = Some(entry.min_deposit.map_or(min, |cur| cur.min(min)));
            }
            if entry.currency.is_none() {
                entry.currency = method.currency.clone();
            }
            if !entry.accounts.contains(&contribution.login) {
                entry.accounts.push(contribution.login.clone());
            }

            match condition_overrides.get(&method.title) {
                Some(override_tag) => {
                    entry.condition_tags.clear();
                    entry.condition_tags.insert(override_tag.clone());
                }
                None => {
                    entry.condition_tags.insert(tag_for_name(&method.name));
                }
            }
        }
    }

    debug!(
        "Merged {} contributions into {} entries ({} preferred)",
        contributions.len(),
        order.len(),
        preferred_order.len()
    );

    order
        .into_iter()
        .filter_map(|title| entries.remove(&title))
        .collect()
}

fn empty_entry(title: &str, env: Environment) -> MergedMethodEntry {
    MergedMethodEntry {
        title: title.to_string(),
        payment_names: Default::default(),
        deposit: false,
        withdraw: false,
        currency: None,
        status: env,
        condition_tags: Default::default(),
        min_deposit: None,
        recommended: false,
        synthetic: false,
        accounts: Vec::new(),
    }
}

/// Availability tag encoded in a variant name.
///
/// A digit run directly before "dep" becomes an "NDEP" tag, "aff" and "mob"
/// substrings become "AFF" and "MOB"; combinations join with '+'. A name
/// encoding no condition at all is available to everyone: "ALL".
pub fn tag_for_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let mut parts: Vec<String> = Vec::new();

    // The digit run may precede any "dep" occurrence, not just the first
    for (pos, _) in lower.match_indices("dep") {
        let digits: String = lower[..pos]
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if !digits.is_empty() {
            parts.push(format!("{}DEP", digits));
            break;
        }
    }
    if lower.contains("aff") {
        parts.push("AFF".to_string());
    }
    if lower.contains("mob") {
        parts.push("MOB".to_string());
    }

    if parts.is_empty() {
        "ALL".to_string()
    } else {
        parts.join("+")
    }
}
