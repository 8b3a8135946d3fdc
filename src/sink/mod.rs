// src/sink/mod.rs
//! Report export abstraction.
//!
//! A pipeline run can export the same per-GEO report to several destinations
//! at once (a CSV file plus the terminal table, say). Sinks are isolated from
//! each other: one failing destination must not lose the others' output.

use crate::types::{DocumentHandle, GeoReport};
use async_trait::async_trait;
use std::sync::Arc;

pub mod csv;
pub mod human;
pub mod json;
pub mod silent;

/// Trait for report export destinations
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Export one per-GEO report, returning a handle to wherever it landed
    async fn export(&self, report: &GeoReport) -> anyhow::Result<DocumentHandle>;
}

/// Manager that fans one report out to multiple sinks
pub struct SinkManager {
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl SinkManager {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Export a report through every sink.
    ///
    /// Errors from individual sinks are logged but don't stop the others;
    /// the error is only propagated when there is a single sink, so a broken
    /// file path still fails loudly in the common one-destination setup.
    pub async fn export(&self, report: &GeoReport) -> anyhow::Result<Vec<DocumentHandle>> {
        let mut handles = Vec::new();
        let mut last_error = None;

        for sink in &self.sinks {
            match sink.export(report).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::warn!("Report sink error for {}/{}: {}", report.project, report.geo, e);
                    last_error = Some(e);
                }
            }
        }

        if let Some(err) = last_error {
            if self.sinks.len() == 1 {
                return Err(err);
            }
        }

        Ok(handles)
    }
}

impl Default for SinkManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Render an optional minimum deposit without a trailing ".0" for whole
/// amounts: 20 -> "20", 12.5 -> "12.5", absent -> "".
pub(crate) fn format_min_deposit(min: Option<f64>) -> String {
    match min {
        None => String::new(),
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{}", v),
    }
}

#[cfg(test)]
pub(crate) fn sample_report() -> GeoReport {
    use crate::types::{Environment, ReportRow};

    GeoReport {
        project: "Ritzo".to_string(),
        geo: "DE".to_string(),
        env: Environment::Prod,
        rows: vec![
            ReportRow {
                paymethod: "Visa".to_string(),
                payment_name: "V/M_Cards\nV/M_Cards_0DEP".to_string(),
                currency: "EUR".to_string(),
                deposit: true,
                withdraw: true,
                status: "PROD".to_string(),
                conditions: "0DEP\nALL".to_string(),
                min_deposit: Some(20.0),
                recommended: true,
                synthetic: false,
                placeholder: false,
            },
            ReportRow {
                paymethod: "Binance Pay".to_string(),
                payment_name: "Binancepay_Binancepay_Crypto".to_string(),
                currency: "EUR".to_string(),
                deposit: true,
                withdraw: false,
                status: "PROD".to_string(),
                conditions: "ALL".to_string(),
                min_deposit: Some(50.0),
                recommended: false,
                synthetic: true,
                placeholder: false,
            },
        ],
        display_order: vec!["Visa".to_string()],
    }
}
