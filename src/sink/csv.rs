// src/sink/csv.rs
//! CSV report sink

use crate::sink::{format_min_deposit, ReportSink};
use crate::types::{DocumentHandle, GeoReport};
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// CSV sink; reports for several GEOs share one header
pub struct CsvSink {
    writer: Mutex<Box<dyn Write + Send>>,
    header_written: Mutex<bool>,
    location: String,
}

impl CsvSink {
    /// Create a new CsvSink that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            header_written: Mutex::new(false),
            location: "stdout".to_string(),
        }
    }

    /// Create a new CsvSink that writes to a file
    pub fn to_file(file: std::fs::File, path: &std::path::Path) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
            header_written: Mutex::new(false),
            location: path.display().to_string(),
        }
    }

    fn ensure_header(&self, writer: &mut dyn Write) -> anyhow::Result<()> {
        let mut header_written = self.header_written.lock().unwrap();
        if !*header_written {
            writeln!(
                writer,
                "geo,paymethod,payment_name,currency,deposit,withdraw,status,conditions,min_deposit"
            )?;
            *header_written = true;
        }
        Ok(())
    }

    /// Escape a field for CSV (wrap in quotes if contains comma/quote/newline)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn yes_no(flag: bool) -> &'static str {
        if flag {
            "YES"
        } else {
            "NO"
        }
    }
}

impl Default for CsvSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for CsvSink {
    async fn export(&self, report: &GeoReport) -> anyhow::Result<DocumentHandle> {
        let mut writer = self.writer.lock().unwrap();

        self.ensure_header(&mut *writer)?;

        for row in &report.rows {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{}",
                Self::escape_field(&report.geo),
                Self::escape_field(&row.paymethod_cell()),
                Self::escape_field(&row.payment_name),
                Self::escape_field(&row.currency),
                Self::yes_no(row.deposit),
                Self::yes_no(row.withdraw),
                row.status,
                Self::escape_field(&row.conditions),
                format_min_deposit(row.min_deposit),
            )?;
        }

        writer.flush()?;
        Ok(DocumentHandle::new(&self.location))
    }
}
