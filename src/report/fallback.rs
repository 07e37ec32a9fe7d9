//! Deterministic reports used when no usable model narrative exists.

use super::{format_average, format_pass_rate, format_scale_value};
use crate::analysis::{names_with_status, status_counts};
use crate::config::ReportConfig;
use crate::models::{
    ClassStatistics, GradeStatus, Report, ReportMetadata, ReportSource, StudentSummary,
    SubjectMeta, SubjectSummary,
};
use chrono::Utc;

/// Narrative used when a subject has no grade rows at all.
pub const NO_DATA_NARRATIVE: &str = "No grades available for this subject.";

const DEFAULT_RECOMMENDATIONS: [&str; 4] = [
    "Offer remedial classes for students near the failing mark.",
    "Highlight best-performing students to encourage motivation.",
    "Review teaching strategies for topics with low performance.",
    "Encourage consistent study habits and attendance.",
];

pub fn default_recommendations() -> Vec<String> {
    DEFAULT_RECOMMENDATIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Report for a subject with no grade rows.
pub fn no_data_report(subject: &SubjectMeta, config: &ReportConfig) -> Report {
    Report {
        subject: SubjectSummary::from(subject),
        narrative_analysis: NO_DATA_NARRATIVE.to_string(),
        passed_names: Vec::new(),
        failed_names: Vec::new(),
        class_statistics: ClassStatistics::default(),
        recommendations: Vec::new(),
        source: ReportSource::Fallback,
        students: Vec::new(),
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            model_used: None,
            student_count: 0,
            passing_threshold: config.passing_threshold,
        },
    }
}

/// Report synthesized from local aggregation only.
pub fn fallback_report(
    subject: &SubjectMeta,
    summaries: Vec<StudentSummary>,
    statistics: ClassStatistics,
    config: &ReportConfig,
    model_used: Option<String>,
) -> Report {
    let narrative = fallback_narrative(subject, &summaries, &statistics, config);

    Report {
        subject: SubjectSummary::from(subject),
        narrative_analysis: narrative,
        passed_names: names_with_status(&summaries, GradeStatus::Passed),
        failed_names: names_with_status(&summaries, GradeStatus::Failed),
        class_statistics: statistics,
        recommendations: default_recommendations(),
        source: ReportSource::Fallback,
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            model_used,
            student_count: summaries.len(),
            passing_threshold: config.passing_threshold,
        },
        students: summaries,
    }
}

/// Templated summary sentence(s) for the fallback report.
pub fn fallback_narrative(
    subject: &SubjectMeta,
    summaries: &[StudentSummary],
    statistics: &ClassStatistics,
    config: &ReportConfig,
) -> String {
    let (passed, failed, ungraded) = status_counts(summaries);

    let mut narrative = format!(
        "For {}, {} were analyzed. The class average is {}. {} passed ({}), while {} did not meet the passing requirement ({}).",
        subject.code,
        students(summaries.len()),
        format_average(statistics.class_average),
        passed,
        format_pass_rate(statistics.pass_rate),
        failed,
        format_scale_value(config.passing_threshold),
    );

    if ungraded > 0 {
        let verb = if ungraded == 1 { "has" } else { "have" };
        narrative.push_str(&format!(
            " {} {} no recorded grades yet.",
            students(ungraded),
            verb
        ));
    }

    narrative
}

fn students(count: usize) -> String {
    if count == 1 {
        "1 student".to_string()
    } else {
        format!("{} students", count)
    }
}
