//! Parsing and validating the model's answer.
//!
//! The model is untrusted. Its text is stripped of code fences and parsed
//! into a typed document; anything that is not a JSON object with a
//! non-empty `analysis` string is a [`Error::MalformedResponse`]. Keys the
//! model left out are filled from the locally computed results.

use super::fallback::default_recommendations;
use crate::analysis::names_with_status;
use crate::error::{Error, Result};
use crate::models::{ClassStatistics, GradeStatus, StudentSummary};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Report document as the model is asked to produce it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReport {
    #[serde(default)]
    analysis: Option<String>,
    #[serde(default)]
    passed_students: Option<Vec<String>>,
    #[serde(default)]
    failed_students: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_statistics")]
    class_statistics: Option<ModelStatistics>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
}

/// Statistics as written by the model. Values may come back as numbers or as
/// strings such as `"1.45"` or `"85.0%"`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelStatistics {
    #[serde(default, deserialize_with = "loose_number")]
    class_average: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    highest_score: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    lowest_score: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pass_rate: Option<f64>,
}

/// A validated model narrative with every gap filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNarrative {
    pub analysis: String,
    pub passed_names: Vec<String>,
    pub failed_names: Vec<String>,
    pub class_statistics: ClassStatistics,
    pub recommendations: Vec<String>,
}

/// Remove markdown code fences the model may have wrapped around the JSON.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse the model's raw text into a complete narrative.
pub fn parse_model_response(
    text: &str,
    summaries: &[StudentSummary],
    local: &ClassStatistics,
) -> Result<ModelNarrative> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(Error::MalformedResponse("empty response".to_string()));
    }

    let parsed: ModelReport = serde_json::from_str(&cleaned)
        .map_err(|e| Error::MalformedResponse(format!("not valid report JSON: {}", e)))?;

    let analysis = match parsed.analysis {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return Err(Error::MalformedResponse(
                "missing \"analysis\" text".to_string(),
            ))
        }
    };

    let stats = parsed.class_statistics.unwrap_or_default();
    let class_statistics = ClassStatistics {
        class_average: stats.class_average.or(local.class_average),
        best_average: stats.highest_score.or(local.best_average),
        worst_average: stats.lowest_score.or(local.worst_average),
        pass_rate: stats
            .pass_rate
            .filter(|rate| (0.0..=100.0).contains(rate))
            .unwrap_or(local.pass_rate),
    };

    Ok(ModelNarrative {
        analysis,
        passed_names: parsed
            .passed_students
            .unwrap_or_else(|| names_with_status(summaries, GradeStatus::Passed)),
        failed_names: parsed
            .failed_students
            .unwrap_or_else(|| names_with_status(summaries, GradeStatus::Failed)),
        class_statistics,
        recommendations: parsed
            .recommendations
            .unwrap_or_else(default_recommendations),
    })
}

/// A `classStatistics` value that is not an object reads as absent, so every
/// field falls back to the local value instead of rejecting the response.
fn lenient_statistics<'de, D>(deserializer: D) -> std::result::Result<Option<ModelStatistics>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| ModelStatistics::deserialize(v).ok()))
}

/// Accept a number, a numeric string (optionally ending in `%`), or null.
/// Anything else reads as absent.
fn loose_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}
