// src/session.rs
//! Test-account authentication.
//!
//! A login failure is rarely fatal for the pipeline: only an explicit
//! credential rejection or a dead host is reported as such. A missing login
//! endpoint or a missing shared password just means the catalogs are fetched
//! unauthenticated.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::endpoint::{EndpointResolver, PostOutcome};
use crate::types::{Operation, TestAccount};

/// What the login attempt established about the account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSession {
    pub token: Option<String>,
    pub currency: Option<String>,
    pub deposit_count: Option<u64>,
    pub authenticated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(AuthSession),
    /// No password configured or no login endpoint; proceed unauthenticated
    Skipped,
    /// The site explicitly refused the credentials
    Rejected { status: u16 },
    /// The host could not be reached at all
    Unreachable { error: String },
}

/// Attempt to authenticate a test account against an already-built resolver.
pub async fn login(
    resolver: &mut EndpointResolver,
    account: &TestAccount,
    password: &str,
) -> LoginOutcome {
    if password.is_empty() {
        debug!("No password configured, skipping login for {}", account.login);
        return LoginOutcome::Skipped;
    }

    let payload = json!({
        "login": account.login,
        "password": password,
        "google_token": "",
        "facebook_token": "",
    });

    match resolver.resolve_and_post(Operation::Login, &payload).await {
        PostOutcome::Success { body, cookie_token } => {
            let mut session = extract_session(&body);
            if session.token.is_none() {
                session.token = cookie_token;
            }
            session.authenticated = true;
            info!(
                "Authenticated {} (currency={:?}, deposits={:?})",
                account.login, session.currency, session.deposit_count
            );
            LoginOutcome::Authenticated(session)
        }
        PostOutcome::Rejected { status } => {
            warn!("Login rejected for {} with status {}", account.login, status);
            LoginOutcome::Rejected { status }
        }
        PostOutcome::NoEndpoint { .. } => {
            debug!("No login endpoint for {}, proceeding unauthenticated", account.login);
            LoginOutcome::Skipped
        }
        PostOutcome::Unreachable { error } => LoginOutcome::Unreachable { error },
    }
}

/// Pull token, account currency and deposit count out of a login response.
///
/// Sites nest the account object at different depths; the first container
/// that carries a recognized key wins.
pub fn extract_session(body: &Value) -> AuthSession {
    const NESTINGS: &[&[&str]] = &[
        &[],
        &["data"],
        &["user"],
        &["account"],
        &["profile"],
        &["data", "user"],
    ];
    const CURRENCY_KEYS: &[&str] = &["currency", "currency_code"];
    const DEPOSIT_KEYS: &[&str] = &["deposit_count", "deposits_count"];

    let mut session = AuthSession::default();

    session.token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    for nesting in NESTINGS {
        let mut container = body;
        let mut ok = true;
        for segment in *nesting {
            match container.get(segment) {
                Some(v) => container = v,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok || !container.is_object() {
            continue;
        }

        if session.currency.is_none() {
            session.currency = CURRENCY_KEYS
                .iter()
                .filter_map(|k| container.get(*k))
                .filter_map(Value::as_str)
                .find(|s| !s.is_empty())
                .map(str::to_string);
        }
        if session.deposit_count.is_none() {
            session.deposit_count = DEPOSIT_KEYS
                .iter()
                .filter_map(|k| container.get(*k))
                .find_map(Value::as_u64);
        }

        if session.currency.is_some() && session.deposit_count.is_some() {
            break;
        }
    }

    session
}
