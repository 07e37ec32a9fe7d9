//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Most flags are optional so that values from
//! `.gradelens.toml` survive unless explicitly overridden.

use crate::config::{Provider, StoreBackend};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// GradeLens - student performance reports with an AI-written narrative
///
/// Averages term grades for one subject, classifies pass/fail, and asks a
/// language model for an analysis. When the model is unreachable or answers
/// with something unusable, a deterministic report is produced instead.
///
/// Examples:
///   gradelens --subject 7c1e... --data grades.json
///   gradelens --subject 7c1e... --store supabase --format json -o report.json
///   gradelens --subject 7c1e... --provider ollama --model llama3.2:latest
///   gradelens --subject 7c1e... --data grades.json --dry-run
///   gradelens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Identifier of the subject to report on
    #[arg(short, long, value_name = "ID", required_unless_present = "init_config")]
    pub subject: Option<String>,

    /// JSON dataset to read instead of the configured store
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Data store backend
    #[arg(long, value_name = "BACKEND")]
    pub store: Option<StoreBackend>,

    /// Text-generation provider
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Model to ask for the narrative
    ///
    /// Can also be set via GRADELENS_MODEL env var or .gradelens.toml config.
    #[arg(short, long, env = "GRADELENS_MODEL")]
    pub model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long, value_name = "URL", env = "GRADELENS_MODEL_URL")]
    pub model_url: Option<String>,

    /// Passing threshold (averages at or below it pass)
    #[arg(long, value_name = "GRADE")]
    pub threshold: Option<f64>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Leave the per-student table out of the report
    #[arg(long)]
    pub no_roster: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .gradelens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Fetch and aggregate, print the prompt, but do not call the model
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when the report had to fall back
    ///
    /// Useful in scheduled jobs that should notice a broken model setup.
    /// A subject with no grade rows also gets the fallback report, so it
    /// exits 2 as well.
    #[arg(long)]
    pub fail_on_fallback: bool,

    /// Generate a default .gradelens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subject id; empty only for --init-config, which never reads it.
    pub fn subject_id(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.subject_id().trim().is_empty() {
            return Err("Subject id must not be empty".to_string());
        }

        if let Some(ref url) = self.model_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Model URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err("Threshold must be a positive number".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Dataset file does not exist: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file;
    /// `--quiet` still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            subject: Some("subject-1".to_string()),
            data: None,
            store: None,
            provider: None,
            model: None,
            model_url: None,
            threshold: None,
            temperature: None,
            timeout: None,
            output: None,
            format: None,
            no_roster: false,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            fail_on_fallback: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "gradelens",
            "--subject",
            "abc",
            "--provider",
            "ollama",
            "--store",
            "supabase",
            "--format",
            "json",
            "--threshold",
            "2.5",
        ])
        .unwrap();

        assert_eq!(args.subject_id(), "abc");
        assert_eq!(args.provider, Some(Provider::Ollama));
        assert_eq!(args.store, Some(StoreBackend::Supabase));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.threshold, Some(2.5));
    }

    #[test]
    fn test_subject_required_unless_init_config() {
        assert!(Args::try_parse_from(["gradelens"]).is_err());
        assert!(Args::try_parse_from(["gradelens", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_invalid_model_url() {
        let mut args = make_args();
        args.model_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_threshold() {
        let mut args = make_args();
        args.threshold = Some(0.0);
        assert!(args.validate().is_err());

        args.threshold = Some(3.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_dataset() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/definitely/not/here/grades.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_fail_on_fallback_help_mentions_empty_subjects() {
        use clap::CommandFactory;

        let command = Args::command();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id() == "fail_on_fallback")
            .unwrap();
        let help = arg.get_long_help().unwrap().to_string();
        assert!(help.contains("no grade rows"));
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_merge_keeps_config_values_without_flags() {
        let mut config = crate::config::Config::default();
        config.report.passing_threshold = 2.75;
        config.merge_with_args(&make_args());
        assert_eq!(config.report.passing_threshold, 2.75);

        let mut args = make_args();
        args.threshold = Some(3.0);
        args.data = Some(PathBuf::from("other.json"));
        config.store.backend = StoreBackend::Supabase;
        config.merge_with_args(&args);
        assert_eq!(config.report.passing_threshold, 3.0);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.data_file, PathBuf::from("other.json"));
    }
}
