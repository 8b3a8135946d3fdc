// src/notifier.rs
use crate::config::WebhookConfig;
use crate::types::{DocumentHandle, Environment};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Notifier {
    client: Client,
    cfg: WebhookConfig,
}

#[derive(Serialize)]
pub struct ExportNotification<'a> {
    pub project: &'a str,
    pub geo: Option<&'a str>,
    pub env: &'a str,
    pub document: &'a str,
    pub row_count: usize,
    pub exported_at: String,
}

impl Notifier {
    pub fn new(cfg: WebhookConfig) -> Self {
        let client = Client::new();
        Self { client, cfg }
    }

    /// Announce a finished export. `geo` is None for whole-project documents.
    pub async fn notify_export(
        &self,
        project: &str,
        geo: Option<&str>,
        env: Environment,
        document: &DocumentHandle,
        row_count: usize,
    ) -> anyhow::Result<()> {
        let payload = ExportNotification {
            project,
            geo,
            env: env.status_label(),
            document: &document.location,
            row_count,
            exported_at: Utc::now().to_rfc3339(),
        };

        let body = serde_json::to_vec(&payload)?;

        let timeout_secs = self.cfg.timeout_secs.unwrap_or(5);
        let mut req = self
            .client
            .post(&self.cfg.url)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .body(body.clone())
            .header("Content-Type", "application/json");

        // Optional HMAC signature header
        if let Some(secret) = &self.cfg.secret {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| anyhow::anyhow!("HMAC init error: {:?}", e))?;
            mac.update(&body);
            let sig = mac.finalize().into_bytes();
            let sig_hex = hex::encode(sig);
            req = req.header("X-Payscout-Signature", sig_hex);
        }

        let resp = req.send().await?;
        resp.error_for_status()?; // non-2xx -> error

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, secret: Option<&str>) -> WebhookConfig {
        WebhookConfig {
            url: server.uri(),
            secret: secret.map(str::to_string),
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn test_notify_export_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = Notifier::new(config_for(&mock_server, None));
        let result = notifier
            .notify_export(
                "Ritzo",
                Some("DE"),
                Environment::Prod,
                &DocumentHandle::new("/tmp/ritzo-de.csv"),
                12,
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notify_export_with_hmac_signature() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("Content-Type", "application/json"))
            .and(header_exists("X-Payscout-Signature"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = Notifier::new(config_for(&mock_server, Some("test_secret_key")));
        let result = notifier
            .notify_export(
                "Ritzo",
                None,
                Environment::Stage,
                &DocumentHandle::new("stdout"),
                3,
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notify_export_payload_structure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "project": "Winshark",
                "geo": "PL_PLN",
                "env": "PROD",
                "document": "/tmp/winshark.csv",
                "row_count": 7
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = Notifier::new(config_for(&mock_server, None));
        let result = notifier
            .notify_export(
                "Winshark",
                Some("PL_PLN"),
                Environment::Prod,
                &DocumentHandle::new("/tmp/winshark.csv"),
                7,
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notify_export_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let notifier = Notifier::new(config_for(&mock_server, None));
        let result = notifier
            .notify_export(
                "Ritzo",
                Some("DE"),
                Environment::Prod,
                &DocumentHandle::new("stdout"),
                0,
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_notify_export_timeout() {
        let mock_server = MockServer::start().await;

        // Delay response longer than timeout
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(10)),
            )
            .mount(&mock_server)
            .await;

        let config = WebhookConfig {
            url: mock_server.uri(),
            secret: None,
            timeout_secs: Some(1), // 1 second timeout
        };

        let notifier = Notifier::new(config);
        let result = notifier
            .notify_export(
                "Ritzo",
                Some("DE"),
                Environment::Prod,
                &DocumentHandle::new("stdout"),
                0,
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_hmac_signature_shape() {
        let secret = "my_secret";
        let payload = ExportNotification {
            project: "Ritzo",
            geo: Some("DE"),
            env: "PROD",
            document: "stdout",
            row_count: 1,
            exported_at: "2025-01-01T00:00:00Z".to_string(),
        };

        let body = serde_json::to_vec(&payload).unwrap();

        // Generate HMAC signature the same way the notifier does
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(&body);
        let expected_sig = hex::encode(mac.finalize().into_bytes());

        assert_eq!(expected_sig.len(), 64); // SHA256 produces 32 bytes = 64 hex chars
        assert!(expected_sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
