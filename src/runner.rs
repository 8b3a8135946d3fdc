// src/runner.rs
//! The pipeline: accounts in, exported reports out.
//!
//! For every requested GEO the runner walks the test accounts in their
//! configured order, collects each account's catalog, folds everything into
//! one report and hands it to the sinks. A broken account (rejected login,
//! timeout, dead host) is logged and skipped; an unknown project or GEO is
//! the caller's mistake and fails hard.

use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::{Config, SiteConfig};
use crate::extractor::{FetchOutcome, SiteExtractor};
use crate::merge::{self, AccountContribution};
use crate::notifier::Notifier;
use crate::report;
use crate::session::LoginOutcome;
use crate::sink::SinkManager;
use crate::types::{Environment, GeoReport, TestAccount};

pub struct Pipeline {
    config: Config,
    env: Environment,
    sinks: SinkManager,
    notifier: Option<Notifier>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        env: Environment,
        sinks: SinkManager,
        notifier: Option<Notifier>,
    ) -> Self {
        Self {
            config,
            env,
            sinks,
            notifier,
        }
    }

    /// Run every requested GEO of a project and export the reports.
    pub async fn run_project(&self, project: &str, geo: Option<&str>, login: Option<&str>) -> Result<()> {
        let site = self.lookup_site(project)?;

        let geos: Vec<String> = match geo {
            Some(geo) => {
                if !self.config.accounts.geo_groups.contains_key(geo) {
                    bail!(
                        "Unknown GEO '{}'. Known GEOs: {}",
                        geo,
                        self.known_geos().join(", ")
                    );
                }
                vec![geo.to_string()]
            }
            None => self.config.accounts.geo_groups.keys().cloned().collect(),
        };

        info!(
            "Starting {} ({}) across {} GEO(s)",
            project,
            self.env.status_label(),
            geos.len()
        );

        let mut exported = 0usize;
        for geo in &geos {
            let report = self.run_geo(site, geo, login).await;
            match self.sinks.export(&report).await {
                Ok(handles) => {
                    exported += 1;
                    if let Some(notifier) = &self.notifier {
                        for handle in &handles {
                            if let Err(e) = notifier
                                .notify_export(project, Some(geo), self.env, handle, report.rows.len())
                                .await
                            {
                                warn!("Webhook notification failed for {}/{}: {}", project, geo, e);
                            }
                        }
                    }
                }
                Err(e) => error!("Export failed for {}/{}: {}", project, geo, e),
            }
        }

        info!("Finished {}: {}/{} GEO reports exported", project, exported, geos.len());
        Ok(())
    }

    /// Extract and merge one GEO. Account failures degrade the report, they
    /// never abort it.
    pub async fn run_geo(&self, site: &SiteConfig, geo: &str, login: Option<&str>) -> GeoReport {
        let accounts = self.accounts_for(geo, login);
        let password = self.config.accounts.shared_password.clone();
        let account_timeout = Duration::from_secs(self.config.extract.account_timeout_secs);

        let mut contributions: Vec<AccountContribution> = Vec::new();
        let mut display_order: Vec<String> = Vec::new();
        let mut recommended: HashSet<(String, String)> = HashSet::new();
        let mut currency: Option<String> = None;

        for account in &accounts {
            let mut extractor = match SiteExtractor::new(
                site,
                self.env,
                account,
                &self.config.extract,
                password.as_deref(),
            ) {
                Ok(extractor) => extractor,
                Err(e) => {
                    warn!("Skipping {}: {}", account.login, e);
                    continue;
                }
            };

            let catalog = match timeout(account_timeout, extractor.fetch(account)).await {
                Ok(FetchOutcome::Catalog(catalog)) => catalog,
                Ok(FetchOutcome::ForbiddenGeo) => {
                    // Every remaining account would short-circuit the same way
                    break;
                }
                Ok(FetchOutcome::LoginRejected { status }) => {
                    warn!("Skipping {}: login rejected ({})", account.login, status);
                    continue;
                }
                Ok(FetchOutcome::Unreachable { error }) => {
                    warn!("Skipping {}: unreachable ({})", account.login, error);
                    continue;
                }
                Err(_) => {
                    warn!(
                        "Skipping {}: exceeded account timeout of {}s",
                        account.login, self.config.extract.account_timeout_secs
                    );
                    continue;
                }
            };

            for method in catalog.deposit.iter().chain(catalog.withdraw.iter()) {
                if !display_order.contains(&method.title) {
                    display_order.push(method.title.clone());
                }
            }
            recommended.extend(catalog.recommended.iter().cloned());
            if currency.is_none() {
                currency = catalog.currency.clone();
            }

            let mut methods = catalog.deposit;
            methods.extend(catalog.withdraw);
            contributions.push(AccountContribution {
                login: account.login.clone(),
                methods,
            });
        }

        let entries = merge::merge_accounts(
            &contributions,
            &display_order,
            &recommended,
            &site.condition_overrides,
            self.env,
        );

        let fallback = currency
            .unwrap_or_else(|| self.config.extract.default_currency.clone());

        info!(
            "{}/{}: {} accounts contributed {} merged entries",
            site.name,
            geo,
            contributions.len(),
            entries.len()
        );

        report::build_report(&site.name, geo, self.env, &entries, &display_order, &fallback)
    }

    /// Credential health check for one login; true when the site issued a
    /// session.
    pub async fn login_check(&self, project: &str, login: &str) -> Result<bool> {
        let site = self.lookup_site(project)?;

        let geo = self
            .config
            .accounts
            .geo_groups
            .iter()
            .find(|(_, logins)| logins.iter().any(|l| l == login))
            .map(|(geo, _)| geo.clone())
            .with_context(|| format!("Login '{}' is not in any configured GEO group", login))?;

        let account = TestAccount::new(login, geo.clone());
        let mut extractor = SiteExtractor::new(
            site,
            self.env,
            &account,
            &self.config.extract,
            self.config.accounts.shared_password.as_deref(),
        )?;

        match extractor.check_login(&account).await {
            LoginOutcome::Authenticated(session) => {
                info!(
                    "{}: login OK for {} ({}) currency={:?} deposits={:?}",
                    project, login, geo, session.currency, session.deposit_count
                );
                Ok(true)
            }
            LoginOutcome::Skipped => {
                warn!("{}: no password configured, nothing to check", project);
                Ok(false)
            }
            LoginOutcome::Rejected { status } => {
                warn!("{}: login rejected for {} with status {}", project, login, status);
                Ok(false)
            }
            LoginOutcome::Unreachable { error } => {
                warn!("{}: unreachable while checking {}: {}", project, login, error);
                Ok(false)
            }
        }
    }

    fn lookup_site(&self, project: &str) -> Result<&SiteConfig> {
        self.config.site(project).with_context(|| {
            format!(
                "Unknown project '{}'. Known projects: {}",
                project,
                self.known_projects().join(", ")
            )
        })
    }

    fn accounts_for(&self, geo: &str, login: Option<&str>) -> Vec<TestAccount> {
        self.config
            .accounts
            .geo_groups
            .get(geo)
            .map(|logins| {
                logins
                    .iter()
                    .filter(|l| login.is_none_or(|wanted| wanted == l.as_str()))
                    .map(|l| TestAccount::new(l.clone(), geo.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn known_projects(&self) -> Vec<String> {
        self.config.sites.iter().map(|s| s.name.clone()).collect()
    }

    pub fn known_geos(&self) -> Vec<String> {
        self.config.accounts.geo_groups.keys().cloned().collect()
    }
}

/// Group assembled logins by GEO for the --list-geos listing.
pub fn geo_listing(config: &Config) -> BTreeMap<String, usize> {
    config
        .accounts
        .geo_groups
        .iter()
        .map(|(geo, logins)| (geo.clone(), logins.len()))
        .collect()
}
