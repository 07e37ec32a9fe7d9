//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.gradelens.toml` files. Credentials never live in the file: it only
//! names the environment variables they are read from.

use crate::cli::OutputFormat;
use crate::error::{Error, Result as PipelineResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".gradelens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Text-generation model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Grading scale and report pipeline settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Data store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Which hosted model API to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// Local or remote Ollama `/api/chat`
    Ollama,
}

/// Text-generation model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Override for the provider's API base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    60
}

impl ModelConfig {
    /// Base URL for the configured provider.
    pub fn effective_base_url(&self) -> String {
        let url = match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, Provider::Gemini) => "https://generativelanguage.googleapis.com",
            (None, Provider::Ollama) => "http://localhost:11434",
        };
        url.trim_end_matches('/').to_string()
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> PipelineResult<String> {
        read_env(&self.api_key_env)
    }
}

/// Grading scale and report pipeline settings.
///
/// The scale direction is fixed to lower-is-better; everything else is
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Averages at or below this value pass.
    #[serde(default = "default_threshold")]
    pub passing_threshold: f64,

    /// Best value on the scale.
    #[serde(default = "default_scale_best")]
    pub scale_best: f64,

    /// Worst value on the scale.
    #[serde(default = "default_scale_worst")]
    pub scale_worst: f64,

    /// Name of the grading system, quoted in the prompt.
    #[serde(default = "default_scale_name")]
    pub scale_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            passing_threshold: default_threshold(),
            scale_best: default_scale_best(),
            scale_worst: default_scale_worst(),
            scale_name: default_scale_name(),
        }
    }
}

impl ReportConfig {
    /// Reject scales that would make classification meaningless.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.passing_threshold.is_finite() || self.passing_threshold <= 0.0 {
            return Err(Error::Configuration(format!(
                "passing_threshold must be a positive number, got {}",
                self.passing_threshold
            )));
        }
        if !self.scale_best.is_finite() || !self.scale_worst.is_finite() {
            return Err(Error::Configuration(
                "scale_best and scale_worst must be finite".to_string(),
            ));
        }
        if self.scale_best >= self.scale_worst {
            return Err(Error::Configuration(format!(
                "scale_best ({}) must be below scale_worst ({})",
                self.scale_best, self.scale_worst
            )));
        }
        Ok(())
    }
}

fn default_threshold() -> f64 {
    3.0
}

fn default_scale_best() -> f64 {
    1.0
}

fn default_scale_worst() -> f64 {
    5.0
}

fn default_scale_name() -> String {
    "College Grading System".to_string()
}

/// Where grade data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local JSON dataset
    #[default]
    File,
    /// Supabase REST API
    Supabase,
}

/// Data store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Dataset path for the file backend.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Environment variable holding the Supabase project URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Environment variable holding the Supabase API key.
    #[serde(default = "default_key_env")]
    pub key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_file: default_data_file(),
            url_env: default_url_env(),
            key_env: default_key_env(),
            timeout_seconds: default_store_timeout(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("grades.json")
}

fn default_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_key_env() -> String {
    "SUPABASE_KEY".to_string()
}

fn default_store_timeout() -> u64 {
    30
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report file path.
    #[serde(default = "default_output")]
    pub path: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    /// Include the per-student table in the printable report.
    #[serde(default = "default_true")]
    pub include_roster: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output(),
            format: OutputFormat::default(),
            include_roster: true,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("student_report.md")
}

fn default_true() -> bool {
    true
}

/// Read a required, non-empty environment variable.
pub fn read_env(name: &str) -> PipelineResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Configuration(format!(
            "environment variable {} is not set",
            name
        ))),
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.model_url {
            self.model.base_url = Some(url.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(threshold) = args.threshold {
            self.report.passing_threshold = threshold;
        }

        // --data implies the file backend
        if let Some(ref data) = args.data {
            self.store.backend = StoreBackend::File;
            self.store.data_file = data.clone();
        }
        if let Some(backend) = args.store {
            self.store.backend = backend;
        }

        if let Some(ref output) = args.output {
            self.output.path = output.clone();
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
        if args.no_roster {
            self.output.include_roster = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
