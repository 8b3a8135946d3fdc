// src/extractor.rs
//! Per-account catalog extraction.
//!
//! One extractor instance serves one (site, account) pair: it owns the HTTP
//! client (the user agent depends on the account's device class), logs in,
//! fetches the deposit and withdraw catalogs, and applies the site's quirks:
//! crypto consolidation and the guaranteed Binance Pay entry.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ExtractConfig, SiteConfig};
use crate::crypto;
use crate::endpoint::{EndpointResolver, ResolveOutcome};
use crate::geo;
use crate::normalize::{self, NormalizeResult};
use crate::session::{self, AuthSession, LoginOutcome};
use crate::types::{Environment, MinSource, NormalizedMethod, Operation, TestAccount};

/// The Binance Pay entry injected when a site guarantees its presence
pub const BINANCE_PAY_TITLE: &str = "Binance Pay";
pub const BINANCE_PAY_NAME: &str = "Binancepay_Binancepay_Crypto";

/// Minimum deposit assigned to fabricated entries
const SYNTHETIC_MIN_DEPOSIT: f64 = 50.0;

/// Everything one account contributed to a GEO
#[derive(Debug, Default)]
pub struct Catalog {
    pub deposit: Vec<NormalizedMethod>,
    pub withdraw: Vec<NormalizedMethod>,
    pub currency: Option<String>,
    pub deposit_count: Option<u64>,
    /// (title, name) pairs the deposit catalog recommends for this country.
    /// Withdraw-side recommendations are deliberately not collected.
    pub recommended: HashSet<(String, String)>,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Catalog(Catalog),
    /// Regulatory exclusion; no network traffic was generated
    ForbiddenGeo,
    /// The site explicitly refused the account's credentials
    LoginRejected { status: u16 },
    /// Host unreachable and offline fallback disabled
    Unreachable { error: String },
}

pub struct SiteExtractor {
    site: SiteConfig,
    extract: ExtractConfig,
    resolver: EndpointResolver,
    password: String,
}

impl SiteExtractor {
    pub fn new(
        site: &SiteConfig,
        env: Environment,
        account: &TestAccount,
        extract: &ExtractConfig,
        password: Option<&str>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(extract.request_timeout_secs))
            .user_agent(account.device_hint().user_agent())
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        let resolver = EndpointResolver::new(
            site.base_url(env),
            client,
            site.locale_prefix.as_deref(),
            site.extra_query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        Ok(Self {
            site: site.clone(),
            extract: extract.clone(),
            resolver,
            password: password.unwrap_or_default().to_string(),
        })
    }

    /// Run the full login + fetch cycle for one account.
    pub async fn fetch(&mut self, account: &TestAccount) -> FetchOutcome {
        if self.site.geo_restricted && geo::is_forbidden(&account.geo) {
            warn!(
                "{}: GEO {} is regulatory-excluded, skipping without any request",
                self.site.name, account.geo
            );
            return FetchOutcome::ForbiddenGeo;
        }

        let session = match session::login(&mut self.resolver, account, &self.password).await {
            LoginOutcome::Authenticated(session) => session,
            LoginOutcome::Skipped => AuthSession::default(),
            LoginOutcome::Rejected { status } => {
                return FetchOutcome::LoginRejected { status };
            }
            LoginOutcome::Unreachable { error } => {
                if !self.extract.offline_fallback {
                    return FetchOutcome::Unreachable { error };
                }
                warn!(
                    "{}: unreachable for {} ({}), degrading to offline session",
                    self.site.name, account.login, error
                );
                AuthSession {
                    currency: Some(self.extract.default_currency.clone()),
                    deposit_count: Some(0),
                    ..AuthSession::default()
                }
            }
        };

        let country = geo::normalize_country_code(&account.geo);
        let token = session.token.as_deref();

        let deposit_raw = self.fetch_items(Operation::Deposit, &country, token).await;
        let withdraw_raw = self.fetch_items(Operation::Withdraw, &country, token).await;

        let NormalizeResult {
            methods: mut deposit,
            currency,
            recommended,
        } = normalize::normalize_items(&deposit_raw, &country, session.currency.as_deref());

        let withdraw_result =
            normalize::normalize_items(&withdraw_raw, &country, currency.as_deref());
        let mut withdraw = withdraw_result.methods;
        let currency = currency.or(withdraw_result.currency);

        for method in &mut deposit {
            method.deposit = true;
            method.recommended = recommended.contains(&method.key());
        }
        for method in &mut withdraw {
            method.withdraw = true;
            method.recommended = recommended.contains(&method.key());
        }

        if self.site.group_crypto {
            deposit = consolidate_crypto(deposit);
            withdraw = consolidate_crypto(withdraw);
        }
        if self.site.require_binance_pay {
            inject_binance_pay(&mut deposit, &withdraw);
        }

        info!(
            "{}: {} -> {} deposit / {} withdraw methods ({} recommended)",
            self.site.name,
            account.login,
            deposit.len(),
            withdraw.len(),
            recommended.len()
        );

        FetchOutcome::Catalog(Catalog {
            deposit,
            withdraw,
            currency,
            deposit_count: session.deposit_count,
            recommended,
        })
    }

    /// Attempt only the login step, for credential health checks.
    pub async fn check_login(&mut self, account: &TestAccount) -> LoginOutcome {
        session::login(&mut self.resolver, account, &self.password).await
    }

    /// Fetch one catalog side; endpoint exhaustion is just an empty list.
    async fn fetch_items(&mut self, op: Operation, country: &str, token: Option<&str>) -> Vec<Value> {
        match self.resolver.resolve_and_call(op, country, token).await {
            ResolveOutcome::Data(body) => catalog_items(body),
            ResolveOutcome::NoEndpoint { attempts } => {
                debug!(
                    "{}: no {} endpoint ({} attempts), treating as empty catalog",
                    self.site.name,
                    op,
                    attempts.len()
                );
                Vec::new()
            }
        }
    }
}

/// Items live under "data" on most sites; a few return a bare array.
fn catalog_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Collapse individual crypto sub-methods into a single Crypto entry.
///
/// If the upstream already carries a genuine "Crypto" record it survives as
/// the consolidated entry; otherwise one is fabricated. The consolidated
/// entry is recommended when any absorbed method was.
pub(crate) fn consolidate_crypto(methods: Vec<NormalizedMethod>) -> Vec<NormalizedMethod> {
    let mut kept = Vec::with_capacity(methods.len());
    let mut absorbed: Vec<NormalizedMethod> = Vec::new();

    for method in methods {
        if method.crypto_parent || crypto::is_crypto_method(&method.title, &method.name) {
            absorbed.push(method);
        } else {
            kept.push(method);
        }
    }

    if absorbed.is_empty() {
        return kept;
    }

    let any_recommended = absorbed.iter().any(|m| m.recommended);
    let deposit = absorbed.iter().any(|m| m.deposit);
    let withdraw = absorbed.iter().any(|m| m.withdraw);
    let currency = absorbed.iter().find_map(|m| m.currency.clone());

    let consolidated = match absorbed.into_iter().find(|m| m.title == "Crypto") {
        Some(mut genuine) => {
            genuine.recommended = any_recommended;
            genuine
        }
        None => NormalizedMethod {
            title: "Crypto".to_string(),
            name: "Crypto".to_string(),
            min_deposit: Some(SYNTHETIC_MIN_DEPOSIT),
            currency,
            min_source: MinSource::Default,
            recommended: any_recommended,
            synthetic: true,
            crypto_parent: false,
            deposit,
            withdraw,
        },
    };

    debug!("Consolidated crypto sub-methods into '{}'", consolidated.name);
    kept.push(consolidated);
    kept
}

/// Guarantee a Binance Pay entry, injecting a fabricated one at most once
/// when neither catalog side carries it.
pub(crate) fn inject_binance_pay(deposit: &mut Vec<NormalizedMethod>, withdraw: &[NormalizedMethod]) {
    let present = deposit
        .iter()
        .chain(withdraw.iter())
        .any(|m| {
            m.title.eq_ignore_ascii_case(BINANCE_PAY_TITLE)
                || m.name.to_ascii_lowercase().contains("binance")
        });
    if present {
        return;
    }

    debug!("Injecting guaranteed Binance Pay entry");
    deposit.push(NormalizedMethod {
        title: BINANCE_PAY_TITLE.to_string(),
        name: BINANCE_PAY_NAME.to_string(),
        min_deposit: Some(SYNTHETIC_MIN_DEPOSIT),
        currency: None,
        min_source: MinSource::Default,
        recommended: false,
        synthetic: true,
        crypto_parent: false,
        deposit: true,
        withdraw: false,
    });
}
