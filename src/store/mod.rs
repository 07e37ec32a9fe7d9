//! Grade data sources.
//!
//! The report pipeline needs a subject's metadata and its grade rows joined
//! to student details. Rows are normalized here: ids may be strings or
//! numbers, and a score of zero, null or empty string means "not recorded".

pub mod file;
pub mod supabase;

pub use file::JsonFileStore;
pub use supabase::SupabaseStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::models::{GradeRecord, StudentInfo, SubjectMeta, TermScores};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::info;

/// Read access to subjects and their grades.
#[allow(async_fn_in_trait)]
pub trait GradeStore {
    /// Subject metadata; `Error::NotFound` when the id is unknown.
    async fn fetch_subject(&self, subject_id: &str) -> Result<SubjectMeta>;

    /// Every grade row for the subject, joined to its student.
    async fn fetch_grades(&self, subject_id: &str) -> Result<Vec<GradeRecord>>;
}

/// Fetch subject metadata and grades concurrently.
pub async fn load_subject_data<S: GradeStore>(
    store: &S,
    subject_id: &str,
) -> Result<(SubjectMeta, Vec<GradeRecord>)> {
    let (subject, records) = futures::try_join!(
        store.fetch_subject(subject_id),
        store.fetch_grades(subject_id)
    )?;

    info!(
        "Loaded subject {} ({}) with {} grade rows",
        subject.code,
        subject.name,
        records.len()
    );

    Ok((subject, records))
}

/// The configured backend.
pub enum DataStore {
    File(JsonFileStore),
    Supabase(SupabaseStore),
}

impl DataStore {
    /// Open the backend named in `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        match config.backend {
            StoreBackend::File => Ok(DataStore::File(JsonFileStore::open(&config.data_file)?)),
            StoreBackend::Supabase => Ok(DataStore::Supabase(SupabaseStore::from_config(config)?)),
        }
    }
}

impl GradeStore for DataStore {
    async fn fetch_subject(&self, subject_id: &str) -> Result<SubjectMeta> {
        match self {
            DataStore::File(store) => store.fetch_subject(subject_id).await,
            DataStore::Supabase(store) => store.fetch_subject(subject_id).await,
        }
    }

    async fn fetch_grades(&self, subject_id: &str) -> Result<Vec<GradeRecord>> {
        match self {
            DataStore::File(store) => store.fetch_grades(subject_id).await,
            DataStore::Supabase(store) => store.fetch_grades(subject_id).await,
        }
    }
}

/// A row of the `subjects` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub subject_code: String,
    pub subject_name: String,
    #[serde(default)]
    pub instructor: Option<String>,
}

impl From<SubjectRow> for SubjectMeta {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.id,
            code: row.subject_code,
            name: row.subject_name,
            instructor: row.instructor,
        }
    }
}

/// A row of the `students` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub student_number: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub year_level: Option<String>,
}

impl From<StudentRow> for StudentInfo {
    fn from(row: StudentRow) -> Self {
        let display_name = format!("{} {}", row.first_name.trim(), row.last_name.trim())
            .trim()
            .to_string();

        Self {
            id: row.id,
            student_number: row.student_number.unwrap_or_else(|| "N/A".to_string()),
            display_name,
            course: row.course,
            year_level: row.year_level,
        }
    }
}

/// A row of the `grades` table, optionally with the student embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeRow {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub subject_id: Option<String>,
    #[serde(default, deserialize_with = "loose_score")]
    pub prelim: Option<f64>,
    #[serde(default, deserialize_with = "loose_score")]
    pub midterm: Option<f64>,
    #[serde(default, deserialize_with = "loose_score")]
    pub semifinal: Option<f64>,
    #[serde(default, rename = "final", deserialize_with = "loose_score")]
    pub final_term: Option<f64>,
    /// Embedded student from a PostgREST join.
    #[serde(default)]
    pub students: Option<StudentRow>,
}

impl GradeRow {
    pub fn scores(&self) -> TermScores {
        TermScores::from_values(self.prelim, self.midterm, self.semifinal, self.final_term)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// Scores arrive as numbers, numeric strings, empty strings or null.
fn loose_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid score: {:?}", s))),
        Some(other) => Err(D::Error::custom(format!("invalid score: {}", other))),
    }
}
