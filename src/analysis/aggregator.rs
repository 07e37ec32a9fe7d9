//! Grade aggregation and class statistics.
//!
//! This module turns raw term scores into per-student averages and
//! pass/fail status, and computes class-level statistics. It is pure: no I/O,
//! no logging, and sums are always taken left to right so identical input
//! gives bit-identical output.

use crate::models::{ClassStatistics, GradeRecord, GradeStatus, StudentSummary};

/// Summarize every record and compute class statistics.
///
/// Averages keep full precision; rounding happens at the display boundary.
pub fn summarize(
    records: &[GradeRecord],
    passing_threshold: f64,
) -> (Vec<StudentSummary>, ClassStatistics) {
    let summaries: Vec<StudentSummary> = records
        .iter()
        .map(|record| summarize_student(record, passing_threshold))
        .collect();

    let statistics = class_statistics(&summaries);
    (summaries, statistics)
}

/// Summarize one student's record.
pub fn summarize_student(record: &GradeRecord, passing_threshold: f64) -> StudentSummary {
    let average = mean(&record.scores.present());

    let status = match average {
        None => GradeStatus::Ungraded,
        Some(avg) if avg <= passing_threshold => GradeStatus::Passed,
        Some(_) => GradeStatus::Failed,
    };

    StudentSummary {
        student: record.student.clone(),
        scores: record.scores,
        average,
        status,
    }
}

/// Statistics over the summaries that have a defined average.
///
/// A class with no graded student yields the degenerate value
/// (`ClassStatistics::default()`).
pub fn class_statistics(summaries: &[StudentSummary]) -> ClassStatistics {
    let averages: Vec<f64> = summaries.iter().filter_map(|s| s.average).collect();

    if averages.is_empty() {
        return ClassStatistics::default();
    }

    let passed = summaries
        .iter()
        .filter(|s| s.status == GradeStatus::Passed)
        .count();

    let best = averages.iter().copied().fold(f64::INFINITY, f64::min);
    let worst = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    ClassStatistics {
        class_average: mean(&averages),
        best_average: Some(best),
        worst_average: Some(worst),
        pass_rate: passed as f64 / averages.len() as f64 * 100.0,
    }
}

/// Count students per status: (passed, failed, ungraded).
pub fn status_counts(summaries: &[StudentSummary]) -> (usize, usize, usize) {
    summaries
        .iter()
        .fold((0, 0, 0), |(p, f, u), s| match s.status {
            GradeStatus::Passed => (p + 1, f, u),
            GradeStatus::Failed => (p, f + 1, u),
            GradeStatus::Ungraded => (p, f, u + 1),
        })
}

/// Display names of students with the given status, in input order.
pub fn names_with_status(summaries: &[StudentSummary], status: GradeStatus) -> Vec<String> {
    summaries
        .iter()
        .filter(|s| s.status == status)
        .map(|s| s.display_name().to_string())
        .collect()
}

/// Round to two decimal places.
pub fn round_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(0.0, |acc, v| acc + v);
    Some(sum / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StudentInfo, TermScores};

    fn record(name: &str, scores: [Option<f64>; 4]) -> GradeRecord {
        GradeRecord {
            student: StudentInfo {
                id: name.to_lowercase(),
                student_number: format!("2024-{}", name.len()),
                display_name: name.to_string(),
                course: Some("BSIT".to_string()),
                year_level: Some("3".to_string()),
            },
            scores: TermScores::from_values(scores[0], scores[1], scores[2], scores[3]),
        }
    }

    #[test]
    fn test_absent_scores_are_excluded() {
        let records = vec![record("Ana", [Some(1.5), None, None, None])];
        let (summaries, _) = summarize(&records, 3.0);
        assert_eq!(summaries[0].average, Some(1.5));
    }

    #[test]
    fn test_zero_scores_are_excluded() {
        let records = vec![record("Ana", [Some(1.5), Some(0.0), Some(0.0), Some(0.0)])];
        let (summaries, _) = summarize(&records, 3.0);
        assert_eq!(summaries[0].average, Some(1.5));
    }

    #[test]
    fn test_status_classification() {
        let records = vec![
            record("Ana", [Some(3.0), Some(3.0), None, None]),
            record("Ben", [Some(3.25), None, None, None]),
            record("Cy", [None, None, None, None]),
        ];
        let (summaries, _) = summarize(&records, 3.0);
        assert_eq!(summaries[0].status, GradeStatus::Passed);
        assert_eq!(summaries[1].status, GradeStatus::Failed);
        assert_eq!(summaries[2].status, GradeStatus::Ungraded);
        assert_eq!(summaries[2].average, None);
    }

    #[test]
    fn test_threshold_is_configuration() {
        let records = vec![record("Ana", [Some(2.5), None, None, None])];
        let (strict, _) = summarize(&records, 2.0);
        let (lenient, _) = summarize(&records, 2.5);
        assert_eq!(strict[0].status, GradeStatus::Failed);
        assert_eq!(lenient[0].status, GradeStatus::Passed);
    }

    #[test]
    fn test_webdev_scenario() {
        let records = vec![
            record("Ana", [Some(1.0), Some(1.25), Some(1.5), Some(1.0)]),
            record("Ben", [None, None, None, None]),
        ];
        let (summaries, stats) = summarize(&records, 3.0);

        assert_eq!(summaries[0].average.map(round_display), Some(1.19));
        assert_eq!(summaries[0].status, GradeStatus::Passed);
        assert_eq!(summaries[1].status, GradeStatus::Ungraded);

        assert_eq!(stats.class_average, Some(1.1875));
        assert_eq!(stats.best_average, Some(1.1875));
        assert_eq!(stats.worst_average, Some(1.1875));
        assert_eq!(stats.pass_rate, 100.0);
    }

    #[test]
    fn test_class_statistics_best_and_worst() {
        let records = vec![
            record("Ana", [Some(1.0), None, None, None]),
            record("Ben", [Some(4.0), None, None, None]),
            record("Cy", [Some(2.0), None, None, None]),
            record("Dee", [Some(5.0), None, None, None]),
        ];
        let (_, stats) = summarize(&records, 3.0);

        assert_eq!(stats.class_average, Some(3.0));
        assert_eq!(stats.best_average, Some(1.0));
        assert_eq!(stats.worst_average, Some(5.0));
        assert_eq!(stats.pass_rate, 50.0);
    }

    #[test]
    fn test_statistics_use_full_precision() {
        // Rounded first these would be 1.13 and 1.38, averaging 1.255.
        let records = vec![
            record("Ana", [Some(1.125), None, None, None]),
            record("Ben", [Some(1.375), None, None, None]),
        ];
        let (_, stats) = summarize(&records, 3.0);
        assert_eq!(stats.class_average, Some(1.25));
    }

    #[test]
    fn test_no_graded_students_is_degenerate() {
        let records = vec![record("Ana", [None, None, None, None])];
        let (_, stats) = summarize(&records, 3.0);
        assert_eq!(stats, ClassStatistics::default());
        assert_eq!(stats.pass_rate, 0.0);

        let (summaries, stats) = summarize(&[], 3.0);
        assert!(summaries.is_empty());
        assert_eq!(stats.pass_rate, 0.0);
    }

    #[test]
    fn test_pass_rate_bounds() {
        let records = vec![
            record("Ana", [Some(5.0), None, None, None]),
            record("Ben", [Some(4.5), None, None, None]),
        ];
        let (_, stats) = summarize(&records, 3.0);
        assert_eq!(stats.pass_rate, 0.0);

        let records = vec![record("Ana", [Some(1.0), None, None, None])];
        let (_, stats) = summarize(&records, 3.0);
        assert_eq!(stats.pass_rate, 100.0);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let records = vec![
            record("Ana", [Some(1.1), Some(2.3), Some(1.7), None]),
            record("Ben", [Some(3.3), Some(2.9), None, Some(3.1)]),
            record("Cy", [Some(1.2), Some(1.4), Some(1.6), Some(1.8)]),
        ];
        let first = summarize(&records, 3.0);
        let second = summarize(&records, 3.0);

        assert_eq!(first, second);
        assert_eq!(
            first.1.class_average.map(f64::to_bits),
            second.1.class_average.map(f64::to_bits)
        );
    }

    #[test]
    fn test_status_counts_and_names() {
        let records = vec![
            record("Ana", [Some(1.0), None, None, None]),
            record("Ben", [Some(4.0), None, None, None]),
            record("Cy", [None, None, None, None]),
            record("Dee", [Some(2.0), None, None, None]),
        ];
        let (summaries, _) = summarize(&records, 3.0);

        assert_eq!(status_counts(&summaries), (2, 1, 1));
        assert_eq!(
            names_with_status(&summaries, GradeStatus::Passed),
            vec!["Ana", "Dee"]
        );
        assert_eq!(names_with_status(&summaries, GradeStatus::Failed), vec!["Ben"]);
    }

    #[test]
    fn test_round_display() {
        assert_eq!(round_display(1.1875), 1.19);
        assert_eq!(round_display(2.0), 2.0);
        assert_eq!(round_display(2.333333), 2.33);
    }
}
