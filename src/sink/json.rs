// src/sink/json.rs
//! JSON report sink

use crate::sink::ReportSink;
use crate::types::{DocumentHandle, GeoReport};
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// Emits each per-GEO report as one pretty-printed JSON document
pub struct JsonSink {
    writer: Mutex<Box<dyn Write + Send>>,
    location: String,
}

impl JsonSink {
    /// Create a new JsonSink that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            location: "stdout".to_string(),
        }
    }

    /// Create a new JsonSink that writes to a file
    pub fn to_file(file: std::fs::File, path: &std::path::Path) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
            location: path.display().to_string(),
        }
    }
}

impl Default for JsonSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for JsonSink {
    async fn export(&self, report: &GeoReport) -> anyhow::Result<DocumentHandle> {
        let json = serde_json::to_string_pretty(report)?;
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(DocumentHandle::new(&self.location))
    }
}
