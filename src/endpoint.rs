// src/endpoint.rs
//! Dynamic API path resolution.
//!
//! Sites in the fleet expose the same logical operations under slightly
//! different paths (with or without a locale segment). The resolver walks a
//! ranked candidate list, trying POST with a JSON body first and GET with
//! equivalent query parameters second, and caches the first combination that
//! answers 200 for the rest of the extractor's life. Exhausting every
//! candidate is a valid outcome, not an error: the caller treats it as "zero
//! methods".

use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::types::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verb {
    Post,
    Get,
}

/// Outcome of a resolved catalog call
#[derive(Debug)]
pub enum ResolveOutcome {
    Data(Value),
    /// Every candidate failed; attempts carry the per-candidate diagnostics
    NoEndpoint { attempts: Vec<String> },
}

/// Outcome of a resolved credential POST
#[derive(Debug)]
pub enum PostOutcome {
    Success {
        body: Value,
        cookie_token: Option<String>,
    },
    /// The endpoint was reachable and explicitly refused the credentials
    Rejected { status: u16 },
    NoEndpoint { attempts: Vec<String> },
    /// Every candidate failed at the connection level
    Unreachable { error: String },
}

pub struct EndpointResolver {
    base_url: String,
    locale: String,
    extra_query: Vec<(String, String)>,
    client: Client,
    resolved: HashMap<Operation, (Verb, String)>,
}

impl EndpointResolver {
    pub fn new(
        base_url: impl Into<String>,
        client: Client,
        locale_prefix: Option<&str>,
        extra_query: Vec<(String, String)>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            locale: locale_prefix.unwrap_or("en").to_string(),
            extra_query,
            client,
            resolved: HashMap::new(),
        }
    }

    fn candidates(&self, op: Operation) -> Vec<String> {
        let tail = match op {
            Operation::Login => "account/login",
            Operation::Deposit => "model/paysystem/deposit",
            Operation::Withdraw => "model/paysystem/withdraw",
        };
        vec![
            format!("/api/v1/{}/{}", self.locale, tail),
            format!("/api/v1/{}", tail),
        ]
    }

    /// Resolve and fetch a method catalog for a country.
    pub async fn resolve_and_call(
        &mut self,
        op: Operation,
        country: &str,
        bearer: Option<&str>,
    ) -> ResolveOutcome {
        // Fast path: a previously resolved endpoint. If it stops answering,
        // drop the cache entry and re-resolve from scratch.
        if let Some((verb, path)) = self.resolved.get(&op).cloned() {
            match self.call(verb, &path, country, bearer).await {
                Ok(Some(body)) => return ResolveOutcome::Data(body),
                _ => {
                    warn!("Cached {} endpoint {} stopped answering, re-resolving", op, path);
                    self.resolved.remove(&op);
                }
            }
        }

        let mut attempts = Vec::new();
        for path in self.candidates(op) {
            for verb in [Verb::Post, Verb::Get] {
                match self.call(verb, &path, country, bearer).await {
                    Ok(Some(body)) => {
                        debug!("Resolved {} endpoint for {}: {:?} {}", op, country, verb, path);
                        self.resolved.insert(op, (verb, path));
                        return ResolveOutcome::Data(body);
                    }
                    Ok(None) => attempts.push(format!("{:?} {} -> non-2xx", verb, path)),
                    Err(e) => attempts.push(format!("{:?} {} -> {}", verb, path, e)),
                }
            }
        }

        debug!("No {} endpoint found on {}: {:?}", op, self.base_url, attempts);
        ResolveOutcome::NoEndpoint { attempts }
    }

    /// Resolve the login path and POST a credential payload to it.
    pub async fn resolve_and_post(&mut self, op: Operation, payload: &Value) -> PostOutcome {
        let mut attempts = Vec::new();
        let mut connection_errors = 0usize;
        let mut last_error = String::new();

        for path in self.candidates(op) {
            let url = format!("{}{}", self.base_url, path);
            let response = self.client.post(&url).json(payload).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let cookie_token = resp
                            .cookies()
                            .find(|c| c.name() == "__token")
                            .map(|c| c.value().to_string());
                        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
                        self.resolved.insert(op, (Verb::Post, path));
                        return PostOutcome::Success { body, cookie_token };
                    }
                    if status.as_u16() == 401 || status.as_u16() == 403 {
                        return PostOutcome::Rejected {
                            status: status.as_u16(),
                        };
                    }
                    attempts.push(format!("POST {} -> {}", path, status));
                }
                Err(e) => {
                    connection_errors += 1;
                    last_error = e.to_string();
                    attempts.push(format!("POST {} -> {}", path, e));
                }
            }
        }

        if connection_errors == attempts.len() && connection_errors > 0 {
            PostOutcome::Unreachable { error: last_error }
        } else {
            PostOutcome::NoEndpoint { attempts }
        }
    }

    /// One attempt against one path. Ok(Some) on 200, Ok(None) on any other
    /// status, Err on connection-level failure.
    async fn call(
        &self,
        verb: Verb,
        path: &str,
        country: &str,
        bearer: Option<&str>,
    ) -> anyhow::Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = match verb {
            Verb::Post => self.client.post(&url).json(&json!({ "country": country })),
            Verb::Get => self.client.get(&url).query(&[("country", country)]),
        };

        for (k, v) in &self.extra_query {
            request = request.query(&[(k.as_str(), v.as_str())]);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(Some(response.json::<Value>().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> EndpointResolver {
        EndpointResolver::new(server.uri(), Client::new(), None, Vec::new())
    }

    #[tokio::test]
    async fn test_first_candidate_wins_and_is_cached() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/en/model/paysystem/deposit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"title": "Visa", "name": "V/M_Cards"}]
            })))
            .expect(2) // initial resolution + cached reuse
            .mount(&server)
            .await;

        let mut resolver = resolver_for(&server);
        for _ in 0..2 {
            match resolver
                .resolve_and_call(Operation::Deposit, "DE", None)
                .await
            {
                ResolveOutcome::Data(body) => {
                    assert_eq!(body["data"][0]["title"], "Visa");
                }
                other => panic!("expected data, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_get_then_next_candidate() {
        let server = MockServer::start().await;

        // Locale-prefixed candidate fails for both verbs
        Mock::given(path("/api/v1/en/model/paysystem/withdraw"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        // Bare candidate rejects POST but answers GET
        Mock::given(method("POST"))
            .and(path("/api/v1/model/paysystem/withdraw"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/model/paysystem/withdraw"))
            .and(query_param("country", "PL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut resolver = resolver_for(&server);
        match resolver
            .resolve_and_call(Operation::Withdraw, "PL", None)
            .await
        {
            ResolveOutcome::Data(body) => assert!(body["data"].as_array().unwrap().is_empty()),
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_candidates_yield_no_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut resolver = resolver_for(&server);
        match resolver
            .resolve_and_call(Operation::Deposit, "DE", None)
            .await
        {
            ResolveOutcome::NoEndpoint { attempts } => {
                // Two candidates, two verbs each
                assert_eq!(attempts.len(), 4);
            }
            other => panic!("expected NoEndpoint, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extra_query_parameters_are_sent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/en/model/paysystem/deposit"))
            .and(query_param("fields", "min,max"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut resolver = EndpointResolver::new(
            server.uri(),
            Client::new(),
            None,
            vec![("fields".to_string(), "min,max".to_string())],
        );
        match resolver
            .resolve_and_call(Operation::Deposit, "DE", None)
            .await
        {
            ResolveOutcome::Data(_) => {}
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_rejection_is_terminal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/en/account/login"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        // The second candidate must never be tried after an explicit rejection
        Mock::given(method("POST"))
            .and(path("/api/v1/account/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut resolver = resolver_for(&server);
        let payload = serde_json::json!({"login": "a", "password": "b"});
        match resolver.resolve_and_post(Operation::Login, &payload).await {
            PostOutcome::Rejected { status } => assert_eq!(status, 401),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_not_found_falls_through_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/en/account/login"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/account/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "abc",
                "currency": "EUR"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut resolver = resolver_for(&server);
        let payload = serde_json::json!({"login": "a", "password": "b"});
        match resolver.resolve_and_post(Operation::Login, &payload).await {
            PostOutcome::Success { body, .. } => assert_eq!(body["token"], "abc"),
            other => panic!("expected success, got {:?}", other),
        }
    }
}
