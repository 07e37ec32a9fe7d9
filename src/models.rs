//! Data models for grade aggregation and reporting.
//!
//! Every type here is a value constructed and consumed within a single
//! report request. Nothing is persisted and nothing is shared between
//! requests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A recorded term score on the institution's grading scale.
///
/// A score of zero is how the hosted tables mark "not yet recorded", so it is
/// never a valid `Score`; [`Score::new`] maps it to `None`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    /// Returns `None` for zero and non-finite values.
    pub fn new(value: f64) -> Option<Self> {
        if value == 0.0 || !value.is_finite() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four term scores of one student in one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TermScores {
    pub prelim: Option<Score>,
    pub midterm: Option<Score>,
    pub semifinal: Option<Score>,
    #[serde(rename = "final")]
    pub final_term: Option<Score>,
}

impl TermScores {
    /// Build from raw values, treating zero as absent.
    pub fn from_values(
        prelim: Option<f64>,
        midterm: Option<f64>,
        semifinal: Option<f64>,
        final_term: Option<f64>,
    ) -> Self {
        Self {
            prelim: prelim.and_then(Score::new),
            midterm: midterm.and_then(Score::new),
            semifinal: semifinal.and_then(Score::new),
            final_term: final_term.and_then(Score::new),
        }
    }

    /// Terms in their fixed order: prelim, midterm, semifinal, final.
    pub fn terms(&self) -> [Option<Score>; 4] {
        [self.prelim, self.midterm, self.semifinal, self.final_term]
    }

    /// Recorded scores only, in term order.
    pub fn present(&self) -> Vec<f64> {
        self.terms()
            .iter()
            .flatten()
            .map(|score| score.value())
            .collect()
    }
}

/// Student details joined onto a grade row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub id: String,
    pub student_number: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_level: Option<String>,
}

/// One student's four term scores for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub student: StudentInfo,
    pub scores: TermScores,
}

/// Subject metadata as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectMeta {
    pub id: String,
    pub code: String,
    pub name: String,
    pub instructor: Option<String>,
}

impl SubjectMeta {
    pub fn instructor_or_na(&self) -> &str {
        match self.instructor.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "N/A",
        }
    }
}

/// Pass/fail classification of a student's average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeStatus {
    Passed,
    Failed,
    /// No term score recorded yet.
    Ungraded,
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeStatus::Passed => write!(f, "PASSED"),
            GradeStatus::Failed => write!(f, "FAILED"),
            GradeStatus::Ungraded => write!(f, "UNGRADED"),
        }
    }
}

/// Per-student result of aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student: StudentInfo,
    pub scores: TermScores,
    /// Mean of the recorded scores at full precision.
    pub average: Option<f64>,
    pub status: GradeStatus,
}

impl StudentSummary {
    pub fn display_name(&self) -> &str {
        &self.student.display_name
    }
}

/// Class-level statistics over students with a defined average.
///
/// On the wire `highestScore` is the best performer, which on a
/// lower-is-better scale is the numerically lowest average, and
/// `lowestScore` is the numerically highest. Existing report consumers
/// depend on these names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassStatistics {
    #[serde(rename = "classAverage")]
    pub class_average: Option<f64>,
    #[serde(rename = "highestScore")]
    pub best_average: Option<f64>,
    #[serde(rename = "lowestScore")]
    pub worst_average: Option<f64>,
    /// Percentage in `[0, 100]`.
    #[serde(rename = "passRate")]
    pub pass_rate: f64,
}

/// Where a report's narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportSource {
    Model,
    Fallback,
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSource::Model => write!(f, "MODEL"),
            ReportSource::Fallback => write!(f, "FALLBACK"),
        }
    }
}

/// Subject header shown on the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub code: String,
    pub name: String,
    pub instructor: String,
}

impl From<&SubjectMeta> for SubjectSummary {
    fn from(subject: &SubjectMeta) -> Self {
        Self {
            code: subject.code.clone(),
            name: subject.name.clone(),
            instructor: subject.instructor_or_na().to_string(),
        }
    }
}

/// Metadata about one report request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// Model that was asked for the narrative, if any request was made.
    pub model_used: Option<String>,
    pub student_count: usize,
    pub passing_threshold: f64,
}

/// The complete performance report for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub subject: SubjectSummary,
    #[serde(rename = "analysis")]
    pub narrative_analysis: String,
    #[serde(rename = "passedStudents")]
    pub passed_names: Vec<String>,
    #[serde(rename = "failedStudents")]
    pub failed_names: Vec<String>,
    #[serde(rename = "classStatistics")]
    pub class_statistics: ClassStatistics,
    pub recommendations: Vec<String>,
    pub source: ReportSource,
    /// Per-student summaries the report was built from.
    pub students: Vec<StudentSummary>,
    pub metadata: ReportMetadata,
}

impl Report {
    pub fn is_fallback(&self) -> bool {
        self.source == ReportSource::Fallback
    }
}
