//! The report pipeline.
//!
//! One call runs: no-data check, aggregation, prompt + model request,
//! response parsing, and fallback. Generation failures never escape;
//! the caller always gets a [`Report`].

use super::fallback::{fallback_report, no_data_report};
use super::prompt::build_prompt;
use super::response::parse_model_response;
use crate::analysis::summarize;
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::llm::TextGenerator;
use crate::models::{GradeRecord, Report, ReportMetadata, ReportSource, SubjectMeta, SubjectSummary};
use crate::store::{load_subject_data, GradeStore};
use chrono::Utc;
use std::future::Future;
use tracing::{debug, info, warn};

/// Builds reports with an injected text-generation client.
pub struct ReportGenerator<G> {
    client: G,
    config: ReportConfig,
}

impl<G: TextGenerator> ReportGenerator<G> {
    pub fn new(client: G, config: ReportConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the subject's data from `store` and generate its report.
    ///
    /// Only data-store errors (unknown subject, unreachable store) are
    /// returned as `Err`; `cancel` behaves as in
    /// [`generate_report`](Self::generate_report).
    pub async fn report_for_subject<S, F>(
        &self,
        store: &S,
        subject_id: &str,
        cancel: F,
    ) -> Result<Report>
    where
        S: GradeStore,
        F: Future<Output = ()>,
    {
        let (subject, records) = load_subject_data(store, subject_id).await?;
        Ok(self.generate_report(&subject, &records, cancel).await)
    }

    /// Generate a report for already materialized subject data.
    ///
    /// The model request is abandoned as soon as `cancel` completes, which
    /// produces a fallback. Pass `std::future::pending()` to never cancel.
    pub async fn generate_report<F>(
        &self,
        subject: &SubjectMeta,
        records: &[GradeRecord],
        cancel: F,
    ) -> Report
    where
        F: Future<Output = ()>,
    {
        if records.is_empty() {
            info!("No grades recorded for {}", subject.code);
            return no_data_report(subject, &self.config);
        }

        let (summaries, statistics) = summarize(records, self.config.passing_threshold);
        info!(
            "Aggregated {} students for {} (class average {:?})",
            summaries.len(),
            subject.code,
            statistics.class_average
        );

        let prompt = build_prompt(subject, &summaries, &self.config);
        let model = self.client.model_name().to_string();
        debug!("Prompt for {} is {} bytes", subject.code, prompt.len());

        let outcome = tokio::select! {
            response = self.client.generate(&prompt) => response
                .and_then(|text| parse_model_response(&text, &summaries, &statistics)),
            _ = cancel => Err(Error::Service("model request cancelled".to_string())),
        };

        match outcome {
            Ok(narrative) => {
                info!("Model {} produced the narrative for {}", model, subject.code);
                Report {
                    subject: SubjectSummary::from(subject),
                    narrative_analysis: narrative.analysis,
                    passed_names: narrative.passed_names,
                    failed_names: narrative.failed_names,
                    class_statistics: narrative.class_statistics,
                    recommendations: narrative.recommendations,
                    source: ReportSource::Model,
                    metadata: ReportMetadata {
                        generated_at: Utc::now(),
                        model_used: Some(model),
                        student_count: summaries.len(),
                        passing_threshold: self.config.passing_threshold,
                    },
                    students: summaries,
                }
            }
            Err(e) => {
                warn!("Using fallback report for {}: {}", subject.code, e);
                fallback_report(subject, summaries, statistics, &self.config, Some(model))
            }
        }
    }
}
