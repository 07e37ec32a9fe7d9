//! A grade store backed by a local JSON export.
//!
//! The file mirrors the hosted tables:
//!
//! ```json
//! { "subjects": [...], "students": [...], "grades": [...] }
//! ```

use super::{GradeRow, GradeStore, StudentRow, SubjectRow};
use crate::error::{Error, Result};
use crate::models::{GradeRecord, StudentInfo, SubjectMeta};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    subjects: Vec<SubjectRow>,
    #[serde(default)]
    students: Vec<StudentRow>,
    #[serde(default)]
    grades: Vec<GradeRow>,
}

/// Subjects, students and grades loaded into memory.
#[derive(Debug)]
pub struct JsonFileStore {
    subjects: Vec<SubjectMeta>,
    students: HashMap<String, StudentInfo>,
    grades: Vec<GradeRow>,
}

impl JsonFileStore {
    /// Load a dataset file.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!("Read {} bytes from {}", content.len(), path.display());
        Self::from_json(&content)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(content)?;

        let students = dataset
            .students
            .into_iter()
            .map(|row| (row.id.clone(), StudentInfo::from(row)))
            .collect();

        Ok(Self {
            subjects: dataset.subjects.into_iter().map(SubjectMeta::from).collect(),
            students,
            grades: dataset.grades,
        })
    }

    fn resolve_student(&self, row: &GradeRow) -> Option<StudentInfo> {
        if let Some(embedded) = &row.students {
            return Some(StudentInfo::from(embedded.clone()));
        }
        row.student_id
            .as_ref()
            .and_then(|id| self.students.get(id))
            .cloned()
    }
}

impl GradeStore for JsonFileStore {
    async fn fetch_subject(&self, subject_id: &str) -> Result<SubjectMeta> {
        self.subjects
            .iter()
            .find(|s| s.id == subject_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Subject", subject_id))
    }

    async fn fetch_grades(&self, subject_id: &str) -> Result<Vec<GradeRecord>> {
        let mut records = Vec::new();

        for row in self
            .grades
            .iter()
            .filter(|g| g.subject_id.as_deref() == Some(subject_id))
        {
            match self.resolve_student(row) {
                Some(student) => records.push(GradeRecord {
                    student,
                    scores: row.scores(),
                }),
                None => warn!(
                    "Skipping grade row for unknown student {:?} in subject {}",
                    row.student_id, subject_id
                ),
            }
        }

        Ok(records)
    }
}
