//! Markdown and JSON rendering of a finished report.

use super::{format_average, format_pass_rate, format_scale_value};
use crate::cli::OutputFormat;
use crate::models::{ClassStatistics, Report, ReportSource, StudentSummary};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, include_roster: bool) -> String {
    let mut output = String::new();

    output.push_str("# Student Performance Report\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_analysis_section(&report.narrative_analysis));
    output.push_str(&generate_statistics_section(&report.class_statistics));

    if include_roster && !report.students.is_empty() {
        output.push_str(&generate_roster_section(&report.students));
    }

    output.push_str(&generate_name_list(
        "Passed Students",
        &report.passed_names,
        "No students passed.",
    ));
    output.push_str(&generate_name_list(
        "Failed Students",
        &report.failed_names,
        "No students failed.",
    ));
    output.push_str(&generate_recommendations_section(&report.recommendations));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(report: &Report) -> String {
    let mut section = String::new();
    let metadata = &report.metadata;

    section.push_str(&format!(
        "- **Subject:** {} - {}\n",
        report.subject.code, report.subject.name
    ));
    section.push_str(&format!("- **Instructor:** {}\n", report.subject.instructor));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Students:** {}\n", metadata.student_count));
    section.push_str(&format!(
        "- **Passing Grade:** ≤ {}\n",
        format_scale_value(metadata.passing_threshold)
    ));

    let source = match (&report.source, &metadata.model_used) {
        (ReportSource::Model, Some(model)) => format!("`{}`", model),
        (ReportSource::Model, None) => "model".to_string(),
        (ReportSource::Fallback, _) => "deterministic fallback".to_string(),
    };
    section.push_str(&format!("- **Narrative Source:** {}\n\n", source));

    section
}

fn generate_analysis_section(analysis: &str) -> String {
    format!("## AI Analysis Summary\n\n{}\n\n", analysis.trim())
}

fn generate_statistics_section(stats: &ClassStatistics) -> String {
    let mut section = String::new();

    section.push_str("## Class Statistics\n\n");
    section.push_str("| Average | Highest Score | Lowest Score | Pass Rate |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        format_average(stats.class_average),
        format_average(stats.best_average),
        format_average(stats.worst_average),
        format_pass_rate(stats.pass_rate),
    ));

    section
}

fn generate_roster_section(students: &[StudentSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Student Performance\n\n");
    section.push_str("| Student | Number | Prelim | Midterm | Semifinal | Final | Average | Status |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for summary in students {
        let terms: Vec<String> = summary
            .scores
            .terms()
            .iter()
            .map(|t| t.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()))
            .collect();

        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            summary.display_name(),
            summary.student.student_number,
            terms[0],
            terms[1],
            terms[2],
            terms[3],
            format_average(summary.average),
            summary.status,
        ));
    }
    section.push('\n');

    section
}

fn generate_name_list(title: &str, names: &[String], empty: &str) -> String {
    let mut section = format!("## {}\n\n", title);

    if names.is_empty() {
        section.push_str(empty);
        section.push_str("\n\n");
        return section;
    }

    for name in names {
        section.push_str(&format!("- {}\n", name));
    }
    section.push('\n');

    section
}

fn generate_recommendations_section(recommendations: &[String]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Recommendations\n\n");

    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by GradeLens v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Pretty JSON using the report's wire keys.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render `report` in `format` and write it to `path`.
pub fn write_report(
    report: &Report,
    path: &Path,
    format: OutputFormat,
    include_roster: bool,
) -> Result<()> {
    let content = match format {
        OutputFormat::Markdown => generate_markdown_report(report, include_roster),
        OutputFormat::Json => generate_json_report(report)?,
    };

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        GradeStatus, ReportMetadata, StudentInfo, SubjectSummary, TermScores,
    };
    use chrono::Utc;

    fn create_test_report(source: ReportSource) -> Report {
        Report {
            subject: SubjectSummary {
                code: "WEBDEV".to_string(),
                name: "Web Development".to_string(),
                instructor: "N/A".to_string(),
            },
            narrative_analysis: "The class performed well.".to_string(),
            passed_names: vec!["Juan Dela Cruz".to_string()],
            failed_names: Vec::new(),
            class_statistics: ClassStatistics {
                class_average: Some(1.1875),
                best_average: Some(1.1875),
                worst_average: Some(1.1875),
                pass_rate: 100.0,
            },
            recommendations: vec!["Keep it up".to_string(), "Add projects".to_string()],
            source,
            students: vec![StudentSummary {
                student: StudentInfo {
                    id: "st-1".to_string(),
                    student_number: "2024-0001".to_string(),
                    display_name: "Juan Dela Cruz".to_string(),
                    course: Some("BSIT".to_string()),
                    year_level: Some("3".to_string()),
                },
                scores: TermScores::from_values(Some(1.0), Some(1.25), Some(1.5), None),
                average: Some(1.25),
                status: GradeStatus::Passed,
            }],
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                model_used: Some("gemini-2.0-flash".to_string()),
                student_count: 1,
                passing_threshold: 3.0,
            },
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(ReportSource::Model);
        let markdown = generate_markdown_report(&report, true);

        assert!(markdown.starts_with("# Student Performance Report"));
        assert!(markdown.contains("- **Subject:** WEBDEV - Web Development"));
        assert!(markdown.contains("- **Narrative Source:** `gemini-2.0-flash`"));
        assert!(markdown.contains("## AI Analysis Summary\n\nThe class performed well."));
        assert!(markdown.contains("| 1.19 | 1.19 | 1.19 | 100.0% |"));
        assert!(markdown.contains("| Juan Dela Cruz | 2024-0001 | 1 | 1.25 | 1.5 | - | 1.25 | PASSED |"));
        assert!(markdown.contains("- Juan Dela Cruz"));
        assert!(markdown.contains("No students failed."));
        assert!(markdown.contains("1. Keep it up\n2. Add projects"));
    }

    #[test]
    fn test_fallback_and_empty_sections() {
        let mut report = create_test_report(ReportSource::Fallback);
        report.passed_names.clear();
        report.recommendations.clear();
        report.class_statistics = ClassStatistics::default();

        let markdown = generate_markdown_report(&report, false);

        assert!(markdown.contains("deterministic fallback"));
        assert!(markdown.contains("| N/A | N/A | N/A | 0.0% |"));
        assert!(markdown.contains("No students passed."));
        assert!(!markdown.contains("## Student Performance\n"));
        assert!(!markdown.contains("## Recommendations"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(ReportSource::Model);
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["analysis"], "The class performed well.");
        assert_eq!(value["passedStudents"][0], "Juan Dela Cruz");
        assert_eq!(value["classStatistics"]["passRate"], 100.0);
        assert!(value["classStatistics"].get("highestScore").is_some());
        assert!(value["classStatistics"].get("lowestScore").is_some());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let report = create_test_report(ReportSource::Model);

        write_report(&report, &path, OutputFormat::Markdown, true).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# Student Performance Report"));

        let json_path = dir.path().join("report.json");
        write_report(&report, &json_path, OutputFormat::Json, true).unwrap();
        let written = std::fs::read_to_string(&json_path).unwrap();
        assert!(written.contains("\"failedStudents\""));
    }
}
