use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod activity;
pub mod mistake;
pub mod practice;
pub mod survey;
pub mod user;

pub use activity::{AchievementRecord, QuizResult};
pub use mistake::{MistakeRecord, MistakeSeverity, MistakeType};
pub use practice::{PracticeOutcome, PracticeSubmission};
pub use survey::{ProficiencyLevel, ProficiencyResult, SurveyAnswer, SurveyOption, SurveyQuestion};
pub use user::{AuthTokens, ChildSummary, UserProfile, UserRole};

/// Content domain a lesson belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Module {
    Quran,
    Qaida,
    Dua,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Quran, Module::Qaida, Module::Dua];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Quran => "Quran",
            Module::Qaida => "Qaida",
            Module::Dua => "Dua",
        }
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quran" => Ok(Module::Quran),
            "qaida" => Ok(Module::Qaida),
            "dua" | "duas" => Ok(Module::Dua),
            other => Err(format!("Unknown module: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Per-lesson progress as stored by the backend, keyed by
/// `(module, level_id, lesson_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub module: Module,
    pub level_id: String,
    pub lesson_id: String,
    pub status: LessonStatus,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub accuracy: f64,
    /// Seconds spent in the lesson across all attempts.
    #[serde(default)]
    pub time_spent: u64,
    pub last_accessed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn is_completed(&self) -> bool {
        self.status == LessonStatus::Completed
    }

    /// When the lesson was finished. Older backend rows carry no
    /// `completedAt`, so the last access time stands in for it.
    pub fn completion_time(&self) -> Option<DateTime<Utc>> {
        if !self.is_completed() {
            return None;
        }
        Some(self.completed_at.unwrap_or(self.last_accessed_at))
    }
}

/// Completed vs. curriculum size for one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCompletion {
    pub completed: u32,
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_record_deserializes_backend_shape() {
        let record: ProgressRecord = serde_json::from_value(json!({
            "module": "Qaida",
            "levelId": "level-1",
            "lessonId": "alif",
            "status": "completed",
            "completionPercentage": 100,
            "accuracy": 92.5,
            "timeSpent": 340,
            "lastAccessedAt": "2024-01-29T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.module, Module::Qaida);
        assert_eq!(record.status, LessonStatus::Completed);
        assert_eq!(record.accuracy, 92.5);
        assert_eq!(record.completed_at, None);
        assert_eq!(record.completion_time(), Some(record.last_accessed_at));
    }

    #[test]
    fn test_completion_time_only_for_completed() {
        let record: ProgressRecord = serde_json::from_value(json!({
            "module": "Dua",
            "levelId": "level-2",
            "lessonId": "morning",
            "status": "in_progress",
            "lastAccessedAt": "2024-01-29T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.completion_time(), None);
    }

    #[test]
    fn test_module_from_str_ignores_case() {
        assert_eq!("quran".parse::<Module>(), Ok(Module::Quran));
        assert_eq!("QAIDA".parse::<Module>(), Ok(Module::Qaida));
        assert_eq!("Duas".parse::<Module>(), Ok(Module::Dua));
        assert!("hadith".parse::<Module>().is_err());
    }

    #[test]
    fn test_module_ordering_is_stable() {
        let mut modules = vec![Module::Dua, Module::Quran, Module::Qaida];
        modules.sort();
        assert_eq!(modules, Module::ALL.to_vec());
    }
}
