// src/cli.rs
use clap::Parser;

/// Payscout: payment-method catalog extraction and reconciliation
///
/// Logs into per-GEO test accounts of a casino project, fetches the deposit
/// and withdraw catalogs, merges them into one report per GEO and exports it.
#[derive(Parser, Debug, Clone)]
#[command(name = "payscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// Path to TOML config file (built-in fleet profile when absent)
    #[arg(short = 'c', long = "config", default_value = "payscout.toml")]
    pub config: String,

    /// Project (site) name to extract
    #[arg(short = 'p', long = "project")]
    pub project: Option<String>,

    /// Restrict the run to one GEO key (e.g. DE or PL_PLN)
    #[arg(short = 'g', long = "geo")]
    pub geo: Option<String>,

    /// Restrict the run to one test-account login
    #[arg(short = 'l', long = "login")]
    pub login: Option<String>,

    /// Target environment: stage or prod
    #[arg(short = 'e', long = "env", default_value = "prod")]
    pub env: String,

    // ===== Output Format =====
    /// Export reports as JSON to stdout
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Export reports as CSV to stdout
    #[arg(long = "csv")]
    pub csv: bool,

    /// Suppress all stdout output (webhook only mode)
    #[arg(short = 's', long = "silent")]
    pub silent: bool,

    // ===== Output Destination =====
    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Override webhook URL from config
    #[arg(long = "webhook")]
    pub webhook_url: Option<String>,

    /// Override webhook secret from config
    #[arg(long = "webhook-secret")]
    pub webhook_secret: Option<String>,

    /// Disable webhook notifications even if configured
    #[arg(long = "no-webhook")]
    pub no_webhook: bool,

    // ===== Utility Commands =====
    /// Check the test-account credentials for --login and exit
    #[arg(long = "login-check")]
    pub login_check: bool,

    /// List configured projects and exit
    #[arg(long = "list-projects")]
    pub list_projects: bool,

    /// List configured GEO groups and exit
    #[arg(long = "list-geos")]
    pub list_geos: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        // Cannot specify multiple output formats
        let format_count = [self.json, self.csv, self.silent]
            .iter()
            .filter(|&&x| x)
            .count();

        if format_count > 1 {
            anyhow::bail!(
                "Cannot specify multiple output formats. \
                Choose one of: --json, --csv, or --silent"
            );
        }

        // Silent mode requires some output (webhook)
        if self.silent && self.no_webhook {
            anyhow::bail!(
                "Cannot use --silent with --no-webhook: no output would be generated.\n\
                Either enable webhooks or use a different output format."
            );
        }

        // Verbose and quiet are mutually exclusive
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.login_check && (self.project.is_none() || self.login.is_none()) {
            anyhow::bail!("--login-check requires both --project and --login");
        }

        // Listing commands need no project; everything else does
        if !self.list_projects && !self.list_geos && self.project.is_none() {
            anyhow::bail!(
                "--project is required (use --list-projects to see what is configured)"
            );
        }

        Ok(())
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else if self.silent {
            OutputFormat::Silent
        } else {
            OutputFormat::Human
        }
    }

    /// Determine log level based on verbose/quiet flags
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored table (default)
    Human,
    /// One JSON document per GEO report
    Json,
    /// CSV format
    Csv,
    /// No stdout output
    Silent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo"]);
        assert_eq!(cli.config, "payscout.toml");
        assert_eq!(cli.env, "prod");
    }

    #[test]
    fn test_custom_config_path() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_json_output_format() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--json"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_csv_output_format() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--csv"]);
        assert_eq!(cli.output_format(), OutputFormat::Csv);
    }

    #[test]
    fn test_default_is_human() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo"]);
        assert_eq!(cli.output_format(), OutputFormat::Human);
    }

    #[test]
    fn test_multiple_formats_invalid() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--json", "--csv"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_silent_without_webhook_invalid() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--silent", "--no-webhook"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_verbose_and_quiet_invalid() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--verbose", "--quiet"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_project_required() {
        let cli = Cli::parse_from(["payscout"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["payscout", "--list-projects"]);
        assert!(cli.validate().is_ok());

        let cli = Cli::parse_from(["payscout", "--list-geos"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_login_check_requires_project_and_login() {
        let cli = Cli::parse_from(["payscout", "--login-check", "-p", "Ritzo"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from([
            "payscout",
            "--login-check",
            "-p",
            "Ritzo",
            "-l",
            "0depnoaffdeeurmobi",
        ]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_valid_combination() {
        let cli = Cli::parse_from([
            "payscout", "-p", "Ritzo", "-g", "PL_PLN", "--json", "--no-webhook",
        ]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_log_level_verbose() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--verbose"]);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_log_level_quiet() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo", "--quiet"]);
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_log_level_default() {
        let cli = Cli::parse_from(["payscout", "-p", "Ritzo"]);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "payscout", "-c", "test.toml", "-p", "Winshark", "-g", "DE", "-e", "stage", "-j",
        ]);
        assert_eq!(cli.config, "test.toml");
        assert_eq!(cli.project.as_deref(), Some("Winshark"));
        assert_eq!(cli.geo.as_deref(), Some("DE"));
        assert_eq!(cli.env, "stage");
        assert!(cli.json);
    }
}
