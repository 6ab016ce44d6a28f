use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Module;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    pub id: String,
    pub module: Module,
    pub level_id: String,
    pub lesson_id: String,
    pub mistake_type: MistakeType,
    pub severity: MistakeSeverity,
    #[serde(default)]
    pub is_resolved: bool,
    /// Missing on some legacy rows; such records sort into the oldest bucket.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeType {
    Pronunciation,
    Recitation,
    Tajweed,
    Memorization,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeSeverity {
    Minor,
    Moderate,
    Major,
}

impl MistakeSeverity {
    /// Severity the backend assigns to a below-threshold attempt.
    pub fn for_accuracy(accuracy: f64) -> Self {
        if accuracy < 50.0 {
            MistakeSeverity::Major
        } else if accuracy < 65.0 {
            MistakeSeverity::Moderate
        } else {
            MistakeSeverity::Minor
        }
    }
}
