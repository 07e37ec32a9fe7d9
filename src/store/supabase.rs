//! A grade store backed by the hosted Supabase (PostgREST) tables.

use super::{GradeRow, GradeStore, SubjectRow};
use crate::config::{read_env, StoreConfig};
use crate::error::{Error, Result};
use crate::llm::http_client;
use crate::models::{GradeRecord, StudentInfo, SubjectMeta};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const STUDENT_COLUMNS: &str = "id,student_number,first_name,last_name,course,year_level";

/// Client for the `subjects` and `grades` tables.
pub struct SupabaseStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_seconds: u64,
}

impl SupabaseStore {
    /// Build a client from the URL and key env vars named in `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = read_env(&config.url_env)?;
        let key = read_env(&config.key_env)?;
        Self::with_credentials(&url, key, config.timeout_seconds)
    }

    pub fn with_credentials(url: &str, api_key: String, timeout_seconds: u64) -> Result<Self> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Configuration(format!(
                "Supabase URL must start with http:// or https://, got {}",
                url
            )));
        }

        Ok(Self {
            http_client: http_client(timeout_seconds)?,
            base_url: url.trim_end_matches('/').to_string(),
            api_key,
            timeout_seconds,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.table_url(table);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "Supabase error {} on {}: {}",
                status, table, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Failed to decode {} rows: {}", table, e)))
    }
}

impl GradeStore for SupabaseStore {
    async fn fetch_subject(&self, subject_id: &str) -> Result<SubjectMeta> {
        let rows: Vec<SubjectRow> = self
            .select(
                "subjects",
                &[
                    ("id", format!("eq.{}", subject_id)),
                    ("select", "*".to_string()),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .map(SubjectMeta::from)
            .ok_or_else(|| Error::not_found("Subject", subject_id))
    }

    async fn fetch_grades(&self, subject_id: &str) -> Result<Vec<GradeRecord>> {
        let rows: Vec<GradeRow> = self
            .select(
                "grades",
                &[
                    ("subject_id", format!("eq.{}", subject_id)),
                    ("select", format!("*,students({})", STUDENT_COLUMNS)),
                ],
            )
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let scores = row.scores();
            match row.students {
                Some(student) => records.push(GradeRecord {
                    student: StudentInfo::from(student),
                    scores,
                }),
                None => warn!(
                    "Skipping grade row without student {:?} in subject {}",
                    row.student_id, subject_id
                ),
            }
        }

        Ok(records)
    }
}
