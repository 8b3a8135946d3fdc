// src/sink/silent.rs
//! Silent sink - discards reports

use crate::sink::ReportSink;
use crate::types::{DocumentHandle, GeoReport};
use async_trait::async_trait;

/// Sink that discards every report
///
/// Used when --silent is set (webhook-only mode)
pub struct SilentSink;

#[async_trait]
impl ReportSink for SilentSink {
    async fn export(&self, _report: &GeoReport) -> anyhow::Result<DocumentHandle> {
        // Intentionally do nothing
        Ok(DocumentHandle::new("discarded"))
    }
}
