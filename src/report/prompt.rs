//! Prompt construction.
//!
//! The data block layout is relied on by downstream prompt tuning, so it is
//! covered by a golden test below. Change it deliberately.

use super::{format_average, format_scale_value};
use crate::config::ReportConfig;
use crate::models::{Score, StudentSummary, SubjectMeta};

/// Build the complete prompt sent to the model.
pub fn build_prompt(
    subject: &SubjectMeta,
    summaries: &[StudentSummary],
    config: &ReportConfig,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are an educational data analyst. Analyze the following student grade data using the {} ({} to {}) where {} = highest and {} = passing.\n\n",
        config.scale_name,
        format_scale_value(config.scale_best),
        format_scale_value(config.scale_worst),
        format_scale_value(config.scale_best),
        format_scale_value(config.passing_threshold),
    ));

    prompt.push_str(&format_student_data(subject, summaries, config));
    prompt.push('\n');
    prompt.push_str(&response_instruction(config));

    prompt
}

/// The tabular part of the prompt: subject header, one block per student,
/// and the grading legend.
pub fn format_student_data(
    subject: &SubjectMeta,
    summaries: &[StudentSummary],
    config: &ReportConfig,
) -> String {
    let mut data = String::new();

    data.push_str(&format!("Subject: {} - {}\n", subject.code, subject.name));
    data.push_str(&format!("Instructor: {}\n", subject.instructor_or_na()));
    data.push_str(&format!("Total Students: {}\n\n", summaries.len()));
    data.push_str("Student Performance Data:\n");

    for (i, summary) in summaries.iter().enumerate() {
        data.push_str(&format_student_block(i + 1, summary));
        data.push('\n');
    }

    let threshold = format_scale_value(config.passing_threshold);
    data.push_str(&format!(
        "Passing Grade: ≤ {} ({})\n",
        threshold, config.scale_name
    ));
    data.push_str(&format!(
        "{} = Excellent | {} = Passing | {} = Failed\n",
        format_scale_value(config.scale_best),
        threshold,
        format_scale_value(config.scale_worst),
    ));

    data
}

fn format_student_block(index: usize, summary: &StudentSummary) -> String {
    let student = &summary.student;
    let scores = &summary.scores;

    format!(
        "{}. {} ({})\n   Course: {}, Year: {}\n   Prelim: {}, Midterm: {}, Semifinal: {}, Final: {}\n   Average: {} - {}\n",
        index,
        student.display_name,
        student.student_number,
        student.course.as_deref().unwrap_or("N/A"),
        student.year_level.as_deref().unwrap_or("N/A"),
        format_score(scores.prelim),
        format_score(scores.midterm),
        format_score(scores.semifinal),
        format_score(scores.final_term),
        format_average(summary.average),
        summary.status,
    )
}

fn format_score(score: Option<Score>) -> String {
    score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn response_instruction(config: &ReportConfig) -> String {
    let threshold = format_scale_value(config.passing_threshold);
    let best = format_scale_value(config.scale_best);
    let worst = format_scale_value(config.scale_worst);

    format!(
        r#"Students marked UNGRADED have no recorded grades yet; leave them out of both student lists.

Please respond ONLY in valid JSON using this structure:
{{
  "analysis": "Detailed summary of performance, strengths, weaknesses, and trends.",
  "passedStudents": ["Names of students who passed (average ≤ {threshold})"],
  "failedStudents": ["Names of students who failed (average > {threshold})"],
  "classStatistics": {{
    "classAverage": "Overall class average ({best} to {worst} scale)",
    "highestScore": "Lowest numeric average (best student)",
    "lowestScore": "Highest numeric average (lowest performer)",
    "passRate": "Percentage of students who passed"
  }},
  "recommendations": ["3 to 5 concrete recommendations for the instructor"]
}}
Return ONLY valid JSON. No markdown, explanations, or extra text.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summarize;
    use crate::models::{GradeRecord, StudentInfo, TermScores};

    fn webdev() -> SubjectMeta {
        SubjectMeta {
            id: "s-1".to_string(),
            code: "WEBDEV".to_string(),
            name: "Web Development".to_string(),
            instructor: None,
        }
    }

    fn records() -> Vec<GradeRecord> {
        vec![
            GradeRecord {
                student: StudentInfo {
                    id: "st-1".to_string(),
                    student_number: "2024-0001".to_string(),
                    display_name: "Juan Dela Cruz".to_string(),
                    course: Some("BSIT".to_string()),
                    year_level: Some("3".to_string()),
                },
                scores: TermScores::from_values(Some(1.0), Some(1.25), Some(1.5), Some(1.0)),
            },
            GradeRecord {
                student: StudentInfo {
                    id: "st-2".to_string(),
                    student_number: "2024-0002".to_string(),
                    display_name: "Maria Santos".to_string(),
                    course: None,
                    year_level: None,
                },
                scores: TermScores::default(),
            },
        ]
    }

    #[test]
    fn test_student_data_golden() {
        let config = ReportConfig::default();
        let (summaries, _) = summarize(&records(), config.passing_threshold);

        let expected = "\
Subject: WEBDEV - Web Development
Instructor: N/A
Total Students: 2

Student Performance Data:
1. Juan Dela Cruz (2024-0001)
   Course: BSIT, Year: 3
   Prelim: 1, Midterm: 1.25, Semifinal: 1.5, Final: 1
   Average: 1.19 - PASSED

2. Maria Santos (2024-0002)
   Course: N/A, Year: N/A
   Prelim: N/A, Midterm: N/A, Semifinal: N/A, Final: N/A
   Average: N/A - UNGRADED

Passing Grade: ≤ 3.0 (College Grading System)
1.0 = Excellent | 3.0 = Passing | 5.0 = Failed
";

        assert_eq!(format_student_data(&webdev(), &summaries, &config), expected);
    }

    #[test]
    fn test_prompt_uses_configured_scale() {
        let config = ReportConfig {
            passing_threshold: 2.75,
            scale_name: "Graduate Grading System".to_string(),
            ..ReportConfig::default()
        };
        let (summaries, _) = summarize(&records(), config.passing_threshold);
        let prompt = build_prompt(&webdev(), &summaries, &config);

        assert!(prompt.contains("Passing Grade: ≤ 2.75 (Graduate Grading System)"));
        assert!(prompt.contains("average ≤ 2.75"));
        assert!(prompt.contains("1.0 = Excellent | 2.75 = Passing | 5.0 = Failed"));
    }

    #[test]
    fn test_prompt_requests_json_schema() {
        let config = ReportConfig::default();
        let (summaries, _) = summarize(&records(), config.passing_threshold);
        let prompt = build_prompt(&webdev(), &summaries, &config);

        assert!(prompt.starts_with("You are an educational data analyst."));
        for key in [
            "\"analysis\"",
            "\"passedStudents\"",
            "\"failedStudents\"",
            "\"classStatistics\"",
            "\"highestScore\"",
            "\"lowestScore\"",
            "\"passRate\"",
            "\"recommendations\"",
        ] {
            assert!(prompt.contains(key), "missing {}", key);
        }
        assert!(prompt.contains("Return ONLY valid JSON"));
    }
}
