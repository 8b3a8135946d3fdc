// End-to-end pipeline tests against a mocked site API
use payscout::config::{AccountsConfig, Config, ExtractConfig, LoggingConfig, SiteConfig, WebhookConfig};
use payscout::notifier::Notifier;
use payscout::runner::Pipeline;
use payscout::sink::{csv::CsvSink, SinkManager};
use payscout::types::Environment;

use serde_json::json;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(site_uri: &str, group_crypto: bool, require_binance_pay: bool) -> Config {
    let mut geo_groups = BTreeMap::new();
    geo_groups.insert(
        "DE".to_string(),
        vec![
            "0depnoaffdeeurmobi".to_string(),
            "4depaffildeeurmobi1".to_string(),
        ],
    );

    Config {
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        extract: ExtractConfig::default(),
        webhook: None,
        accounts: AccountsConfig {
            shared_password: Some("123123123".to_string()),
            geo_groups,
        },
        sites: vec![SiteConfig {
            name: "Testsite".to_string(),
            stage_url: site_uri.to_string(),
            prod_url: site_uri.to_string(),
            locale_prefix: None,
            extra_query: BTreeMap::new(),
            geo_restricted: false,
            group_crypto,
            require_binance_pay,
            condition_overrides: BTreeMap::new(),
        }],
    }
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/en/account/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "session-token",
            "currency": "EUR",
            "deposit_count": 0
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/en/model/paysystem/deposit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "title": "Visa", "name": "V/M_Cards_0DEP", "min": 10,
                    "paymethods": {"recomended": {"status": true, "countries": ["DE"]}}
                },
                {"title": "Skrill", "name": "Skrill_Wallet_aff", "min": 20},
                {"title": "BTC", "name": "Coinspaid_BTC", "min": 25},
                {"title": "ETH", "name": "Coinspaid_ETH", "min": 30}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/en/model/paysystem/withdraw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"title": "Visa", "name": "V/M_Cards", "min": 10}
            ]
        })))
        .mount(server)
        .await;
}

async fn run_to_csv(config: Config) -> String {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("report.csv");
    let file = std::fs::File::create(&csv_path).unwrap();

    let mut sinks = SinkManager::new();
    sinks.add_sink(Arc::new(CsvSink::to_file(file, &csv_path)));

    let pipeline = Pipeline::new(config, Environment::Prod, sinks, None);
    pipeline
        .run_project("Testsite", Some("DE"), None)
        .await
        .unwrap();

    let mut contents = String::new();
    std::fs::File::open(&csv_path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

#[tokio::test]
async fn test_end_to_end_plain_site() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let contents = run_to_csv(test_config(&site.uri(), false, false)).await;

    // Recommended Visa leads the body and carries the marker
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with("geo,paymethod"));
    assert!(lines[1].starts_with("DE,Visa*"));
    assert!(contents.contains("Skrill"));

    // Variant names from both accounts merged into one row
    assert!(contents.contains("V/M_Cards"));
    assert!(contents.contains("V/M_Cards_0DEP"));

    // Condition tags derived from variant names
    assert!(contents.contains("0DEP"));
    assert!(contents.contains("AFF"));

    // No quirks configured: crypto sub-methods stay individual, no Binance Pay
    assert!(contents.contains("BTC"));
    assert!(contents.contains("ETH"));
    assert!(!contents.contains("Binance Pay"));
}

#[tokio::test]
async fn test_end_to_end_quirky_site() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let contents = run_to_csv(test_config(&site.uri(), true, true)).await;

    // Crypto sub-methods consolidated into a single fabricated entry
    assert!(!contents.contains("Coinspaid_BTC"));
    assert!(!contents.contains("Coinspaid_ETH"));
    assert!(contents.lines().any(|l| l.starts_with("DE,Crypto,Crypto,")));

    // Guaranteed Binance Pay entry, injected exactly once
    assert_eq!(contents.matches("Binance Pay").count(), 1);
    assert!(contents.contains("Binancepay_Binancepay_Crypto"));

    // Consolidated entry carries the fabricated floor
    let crypto_line = contents
        .lines()
        .find(|l| l.starts_with("DE,Crypto"))
        .unwrap();
    assert!(crypto_line.ends_with(",50"));
}

#[tokio::test]
async fn test_forbidden_geo_generates_no_traffic() {
    let site = MockServer::start().await;
    // Any request against the site is a failure
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&site)
        .await;

    let mut config = test_config(&site.uri(), false, false);
    config.sites[0].geo_restricted = true;

    let contents = run_to_csv(config).await;
    // Header only, no data rows
    assert_eq!(contents.lines().count(), 1);
}

#[tokio::test]
async fn test_webhook_notification_after_export() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("X-Payscout-Signature"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&webhook)
        .await;

    let mut config = test_config(&site.uri(), false, false);
    config.webhook = Some(WebhookConfig {
        url: webhook.uri(),
        secret: Some("secret".to_string()),
        timeout_secs: Some(5),
    });
    let notifier = config.webhook.as_ref().map(|c| Notifier::new(c.clone()));

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("report.csv");
    let file = std::fs::File::create(&csv_path).unwrap();
    let mut sinks = SinkManager::new();
    sinks.add_sink(Arc::new(CsvSink::to_file(file, &csv_path)));

    let pipeline = Pipeline::new(config, Environment::Prod, sinks, notifier);
    pipeline
        .run_project("Testsite", Some("DE"), None)
        .await
        .unwrap();

    let requests = webhook.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["project"], "Testsite");
    assert_eq!(body["geo"], "DE");
    assert_eq!(body["env"], "PROD");
    assert_eq!(body["document"], csv_path.display().to_string());
}

#[tokio::test]
async fn test_webhook_failure_does_not_fail_the_run() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&webhook)
        .await;

    let mut config = test_config(&site.uri(), false, false);
    config.webhook = Some(WebhookConfig {
        url: webhook.uri(),
        secret: None,
        timeout_secs: Some(5),
    });
    let notifier = config.webhook.as_ref().map(|c| Notifier::new(c.clone()));

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("report.csv");
    let file = std::fs::File::create(&csv_path).unwrap();
    let mut sinks = SinkManager::new();
    sinks.add_sink(Arc::new(CsvSink::to_file(file, &csv_path)));

    let pipeline = Pipeline::new(config, Environment::Prod, sinks, notifier);
    assert!(pipeline
        .run_project("Testsite", Some("DE"), None)
        .await
        .is_ok());

    // The report still landed on disk
    let mut contents = String::new();
    std::fs::File::open(&csv_path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert!(contents.contains("Visa*"));
}
