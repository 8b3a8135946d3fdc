// src/sink/human.rs
//! Human-readable colored terminal report

use crate::sink::{format_min_deposit, ReportSink};
use crate::types::{DocumentHandle, GeoReport, ReportRow};
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Terminal table sink with colored output
pub struct HumanSink {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
    location: String,
}

impl HumanSink {
    /// Create a new HumanSink that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
            location: "stdout".to_string(),
        }
    }

    /// Create a new HumanSink that writes to a file
    pub fn to_file(file: std::fs::File, path: &std::path::Path) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
            use_colors: false, // No colors when writing to file
            location: path.display().to_string(),
        }
    }

    fn yes_no(flag: bool, colors: bool) -> String {
        match (flag, colors) {
            (true, true) => "YES".green().to_string(),
            (false, true) => "NO".red().to_string(),
            (true, false) => "YES".to_string(),
            (false, false) => "NO".to_string(),
        }
    }

    fn conditions_cell(row: &ReportRow) -> String {
        row.conditions.replace('\n', ", ")
    }
}

impl Default for HumanSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for HumanSink {
    async fn export(&self, report: &GeoReport) -> anyhow::Result<DocumentHandle> {
        let mut writer = self.writer.lock().unwrap();

        let heading = format!(
            "{} / {} ({}) - {} methods",
            report.project,
            report.geo,
            report.env.status_label(),
            report.rows.len()
        );
        if self.use_colors {
            writeln!(writer, "{}", heading.bold())?;
        } else {
            writeln!(writer, "{}", heading)?;
        }

        for row in &report.rows {
            let name = row.paymethod_cell();
            let name = if self.use_colors {
                if row.placeholder {
                    name.dimmed().to_string()
                } else if row.recommended {
                    name.cyan().bold().to_string()
                } else {
                    name.normal().to_string()
                }
            } else {
                name
            };

            writeln!(
                writer,
                "  {:<28} dep={:<4} wd={:<4} min={:<8} {}",
                name,
                Self::yes_no(row.deposit, self.use_colors),
                Self::yes_no(row.withdraw, self.use_colors),
                format_min_deposit(row.min_deposit),
                Self::conditions_cell(row),
            )?;
        }

        writer.flush()?;
        Ok(DocumentHandle::new(&self.location))
    }
}
