// src/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Target environment for a site profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Stage,
    Prod,
}

impl Environment {
    /// Upper-cased label used in the Status report column
    pub fn status_label(&self) -> &'static str {
        match self {
            Environment::Stage => "STAGE",
            Environment::Prod => "PROD",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Stage => write!(f, "stage"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stage" => Ok(Environment::Stage),
            "prod" => Ok(Environment::Prod),
            other => anyhow::bail!("Invalid environment '{}'. Must be 'stage' or 'prod'", other),
        }
    }
}

/// Logical upstream operation resolved against a site's API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Deposit,
    Withdraw,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device class inferred from the test login naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceHint {
    Mobile,
    Desktop,
}

const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
const DESKTOP_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.3 Safari/605.1.15";

impl DeviceHint {
    pub fn user_agent(&self) -> &'static str {
        match self {
            DeviceHint::Mobile => MOBILE_UA,
            DeviceHint::Desktop => DESKTOP_UA,
        }
    }
}

/// A per-GEO test account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestAccount {
    pub login: String,
    pub geo: String,
}

impl TestAccount {
    pub fn new(login: impl Into<String>, geo: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            geo: geo.into(),
        }
    }

    /// Mobile accounts carry "mobi" in the login, everything else is desktop
    pub fn device_hint(&self) -> DeviceHint {
        if self.login.contains("mobi") {
            DeviceHint::Mobile
        } else {
            DeviceHint::Desktop
        }
    }
}

/// Where a method's minimum deposit was resolved from.
///
/// The order of the variants mirrors the resolution priority: a dedicated
/// min-deposit-flow field beats the generic min, which beats the lowest value
/// of a range, which beats the default amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinSource {
    MinDepFlow,
    Min,
    Range,
    Default,
    None,
}

impl fmt::Display for MinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MinSource::MinDepFlow => "min_dep_flow",
            MinSource::Min => "min",
            MinSource::Range => "range",
            MinSource::Default => "default",
            MinSource::None => "none",
        };
        f.write_str(s)
    }
}

/// A payment method entry normalized from one site's raw catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMethod {
    /// Human-facing category name (e.g. "Visa/Mastercard")
    pub title: String,

    /// Machine-facing variant identifier, often encoding conditions
    pub name: String,

    pub min_deposit: Option<f64>,

    pub currency: Option<String>,

    pub min_source: MinSource,

    pub recommended: bool,

    /// True when the record was fabricated rather than returned by the API
    #[serde(default)]
    pub synthetic: bool,

    /// True when the upstream record was filed under the Crypto parent category
    #[serde(default)]
    pub crypto_parent: bool,

    /// True when the method appeared in the deposit catalog
    #[serde(default)]
    pub deposit: bool,

    /// True when the method appeared in the withdraw catalog
    #[serde(default)]
    pub withdraw: bool,
}

impl NormalizedMethod {
    pub fn key(&self) -> (String, String) {
        (self.title.clone(), self.name.clone())
    }
}

/// One payment-method title folded across every test account of a GEO
#[derive(Debug, Clone, PartialEq)]
pub struct MergedMethodEntry {
    pub title: String,

    /// All distinct variant names observed for this title
    pub payment_names: BTreeSet<String>,

    pub deposit: bool,
    pub withdraw: bool,

    pub currency: Option<String>,

    pub status: Environment,

    /// Distinct condition-tag combinations ("0DEP+AFF", "MOB", "ALL", ...)
    pub condition_tags: BTreeSet<String>,

    /// Floor of the minimum deposit across contributing accounts
    pub min_deposit: Option<f64>,

    pub recommended: bool,

    /// Any contributing record was synthetic
    pub synthetic: bool,

    /// Logins that contributed this title (GEO-wide coverage)
    pub accounts: Vec<String>,
}

impl MergedMethodEntry {
    /// A title that appeared in the preferred order but gathered no data from
    /// any account is a placeholder row; it sorts to the very end of a report.
    pub fn is_placeholder(&self) -> bool {
        self.payment_names.is_empty()
    }
}

/// Flattened record handed to report sinks, one row per title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub paymethod: String,
    pub payment_name: String,
    pub currency: String,
    pub deposit: bool,
    pub withdraw: bool,
    pub status: String,
    pub conditions: String,
    pub min_deposit: Option<f64>,
    pub recommended: bool,
    pub synthetic: bool,
    #[serde(skip)]
    pub placeholder: bool,
}

impl ReportRow {
    /// Paymethod cell with the recommendation marker the reports carry
    pub fn paymethod_cell(&self) -> String {
        if self.recommended {
            format!("{}*", self.paymethod)
        } else {
            self.paymethod.clone()
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deposit={} withdraw={}",
            self.paymethod_cell(),
            if self.deposit { "YES" } else { "NO" },
            if self.withdraw { "YES" } else { "NO" }
        )
    }
}

/// A fully assembled per-GEO report ready for export
#[derive(Debug, Clone, Serialize)]
pub struct GeoReport {
    pub project: String,
    pub geo: String,
    pub env: Environment,
    pub rows: Vec<ReportRow>,

    /// Display-order hint for export collaborators
    pub display_order: Vec<String>,
}

/// Opaque handle returned by an export collaborator (file path, URL, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub location: String,
}

impl DocumentHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}
