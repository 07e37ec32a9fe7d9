//! GradeLens - AI-assisted student performance reports
//!
//! A CLI tool that aggregates term grades for one subject, asks a hosted
//! language model for a narrative analysis, and writes a Markdown or JSON
//! report. When the model is unavailable or answers badly, a deterministic
//! report built from the local statistics is written instead.
//!
//! Exit codes:
//!   0 - Report written
//!   1 - Runtime error (unknown subject, store failure, missing credentials, etc.)
//!   2 - Fallback report written and --fail-on-fallback was set

mod analysis;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use llm::{ModelClient, TextGenerator};
use report::ReportGenerator;
use std::time::{Duration, Instant};
use store::{load_subject_data, DataStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is loaded before logging so `[general] verbose` takes effect.
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config)?;

    info!("GradeLens v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);
    debug!("Arguments: {:?}", args);

    match run_report(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .gradelens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to choose the model provider, data store, and grading scale.");
    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides the flag-derived level.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = args.log_level(config.general.verbose);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete report workflow. Returns the exit code (0 or 2).
async fn run_report(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.report.validate()?;

    let subject_id = args.subject_id().to_string();

    // Build the model client before touching the store so missing
    // credentials fail fast.
    let client = if args.dry_run {
        None
    } else {
        Some(ModelClient::from_config(&config.model)?)
    };

    println!("📥 Loading grades for subject: {}", subject_id);
    let store = DataStore::open(&config.store)?;

    let Some(client) = client else {
        return handle_dry_run(&store, &subject_id, &config).await;
    };

    println!("🤖 Requesting analysis from {}...", client.model_name());
    println!("   Timeout: {}s", config.model.timeout_seconds);

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        pb.set_message("Waiting for the model (Ctrl-C to skip)");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let generator = ReportGenerator::new(client, config.report.clone());
    let cancel = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; writing the fallback report");
        } else {
            std::future::pending::<()>().await;
        }
    };
    let result = generator
        .report_for_subject(&store, &subject_id, cancel)
        .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    println!("   {} - {}", report.subject.code, report.subject.name);

    report::write_report(
        &report,
        &config.output.path,
        config.output.format,
        config.output.include_roster,
    )
    .with_context(|| format!("Failed to write report to {}", config.output.path.display()))?;

    let stats = &report.class_statistics;
    println!("\n📊 Report Summary:");
    println!("   Students: {}", report.metadata.student_count);
    println!(
        "   Class average: {} | Pass rate: {}",
        report::format_average(stats.class_average),
        report::format_pass_rate(stats.pass_rate)
    );
    println!(
        "   Passed: {} | Failed: {}",
        report.passed_names.len(),
        report.failed_names.len()
    );
    println!("   Narrative: {}", report.source);
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Report saved to: {}",
        config.output.path.display()
    );

    if args.fail_on_fallback && report.is_fallback() {
        eprintln!("\n⛔ The model narrative was unavailable. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: print the aggregation and the prompt, make no model call.
async fn handle_dry_run(store: &DataStore, subject_id: &str, config: &Config) -> Result<i32> {
    let (subject, records) = load_subject_data(store, subject_id).await?;
    println!(
        "   {} - {} ({} grade rows)",
        subject.code,
        subject.name,
        records.len()
    );

    println!("\n🔍 Dry run: aggregating grades (no model call)...\n");

    if records.is_empty() {
        println!("   No grades recorded for {}.", subject.code);
        println!("\n✅ Dry run complete. No model calls were made.");
        return Ok(0);
    }

    let (summaries, stats) = analysis::summarize(&records, config.report.passing_threshold);
    for summary in &summaries {
        println!(
            "     {} ({}): {} - {}",
            summary.display_name(),
            summary.student.student_number,
            report::format_average(summary.average),
            summary.status
        );
    }
    println!(
        "\n   Class average: {} | Best: {} | Worst: {} | Pass rate: {}",
        report::format_average(stats.class_average),
        report::format_average(stats.best_average),
        report::format_average(stats.worst_average),
        report::format_pass_rate(stats.pass_rate)
    );

    println!("\n--- Prompt ---\n");
    println!(
        "{}",
        report::prompt::build_prompt(&subject, &summaries, &config.report)
    );

    println!("✅ Dry run complete. No model calls were made.");
    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so it returns where the configuration
/// came from instead of logging it.
fn load_config(args: &Args) -> Result<(Config, String)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, config::CONFIG_FILE_NAME.to_string())),
        Ok(None) => Ok((Config::default(), "built-in defaults".to_string())),
        Err(e) => {
            eprintln!(
                "⚠️  Ignoring {}: {:#}",
                config::CONFIG_FILE_NAME,
                e
            );
            Ok((Config::default(), "built-in defaults".to_string()))
        }
    }
}
