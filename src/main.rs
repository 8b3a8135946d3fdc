// src/main.rs
use clap::Parser;
use payscout::cli::{Cli, OutputFormat};
use payscout::config::Config;
use payscout::notifier::Notifier;
use payscout::runner::{self, Pipeline};
use payscout::sink::{csv, human, json, silent, SinkManager};
use payscout::types::Environment;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Load config file, falling back to the built-in fleet profile
    let mut config = Config::load_or_builtin(Path::new(&cli.config))?;

    // Apply CLI overrides
    if let Some(ref url) = cli.webhook_url {
        match config.webhook {
            Some(ref mut webhook) => webhook.url = url.clone(),
            None => {
                config.webhook = Some(payscout::config::WebhookConfig {
                    url: url.clone(),
                    secret: None,
                    timeout_secs: None,
                });
            }
        }
    }

    if let Some(ref secret) = cli.webhook_secret {
        if let Some(ref mut webhook) = config.webhook {
            webhook.secret = Some(secret.clone());
        }
    }

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        &config.logging.level
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Starting payscout...");

    // Listing commands exit before any network activity
    if cli.list_projects {
        for site in &config.sites {
            println!("{}", site.name);
        }
        return Ok(());
    }
    if cli.list_geos {
        for (geo, count) in runner::geo_listing(&config) {
            println!("{} ({} accounts)", geo, count);
        }
        return Ok(());
    }

    let env: Environment = cli.env.parse()?;

    // Create sink manager and add sinks based on format
    let mut sinks = SinkManager::new();

    match cli.output_format() {
        OutputFormat::Human => {
            if let Some(ref path) = cli.output {
                let file = std::fs::File::create(path)?;
                sinks.add_sink(Arc::new(human::HumanSink::to_file(file, Path::new(path))));
                tracing::info!("Writing human-readable report to: {}", path);
            } else {
                sinks.add_sink(Arc::new(human::HumanSink::new()));
            }
        }
        OutputFormat::Json => {
            if let Some(ref path) = cli.output {
                let file = std::fs::File::create(path)?;
                sinks.add_sink(Arc::new(json::JsonSink::to_file(file, Path::new(path))));
                tracing::info!("Writing JSON report to: {}", path);
            } else {
                sinks.add_sink(Arc::new(json::JsonSink::new()));
            }
        }
        OutputFormat::Csv => {
            if let Some(ref path) = cli.output {
                let file = std::fs::File::create(path)?;
                sinks.add_sink(Arc::new(csv::CsvSink::to_file(file, Path::new(path))));
                tracing::info!("Writing CSV report to: {}", path);
            } else {
                sinks.add_sink(Arc::new(csv::CsvSink::new()));
            }
        }
        OutputFormat::Silent => {
            sinks.add_sink(Arc::new(silent::SilentSink));
            tracing::info!("Silent mode: no stdout output");
        }
    }

    // Create notifier if configured and not disabled
    let notifier = if cli.no_webhook {
        tracing::info!("Webhooks disabled");
        None
    } else {
        match config.webhook {
            Some(ref webhook_config) => {
                tracing::info!("Webhook enabled: {}", webhook_config.url);
                Some(Notifier::new(webhook_config.clone()))
            }
            None => {
                tracing::debug!("No webhook configured");
                None
            }
        }
    };

    let Some(project) = cli.project.clone() else {
        anyhow::bail!("--project is required");
    };

    let pipeline = Pipeline::new(config, env, sinks, notifier);

    if cli.login_check {
        let Some(login) = cli.login.clone() else {
            anyhow::bail!("--login-check requires --login");
        };
        let ok = pipeline.login_check(&project, &login).await?;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    pipeline
        .run_project(&project, cli.geo.as_deref(), cli.login.as_deref())
        .await?;

    Ok(())
}
