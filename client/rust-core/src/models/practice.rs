use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{MistakeRecord, MistakeSeverity, Module, ProgressRecord};

/// Body of `POST /progress/practice`. The idempotency key makes retries safe.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSubmission {
    pub idempotency_key: String,
    pub module: Module,
    #[validate(length(min = 1, message = "levelId is required"))]
    pub level_id: String,
    #[validate(length(min = 1, message = "lessonId is required"))]
    pub lesson_id: String,
    #[validate(range(min = 0.0, max = 100.0, message = "accuracy must be within 0..=100"))]
    pub accuracy: f64,
    pub time_spent: u64,
    pub needs_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_severity: Option<MistakeSeverity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeOutcome {
    pub progress: ProgressRecord,
    #[serde(default)]
    pub mistake: Option<MistakeRecord>,
    /// Mistakes the backend closed because this attempt was good enough.
    #[serde(default)]
    pub auto_resolved: Vec<String>,
    #[serde(default)]
    pub coins_earned: u32,
}

impl PracticeOutcome {
    /// Mirrors the backend's auto-resolution onto an already fetched list so
    /// the screen can update without refetching.
    pub fn apply_to(&self, mistakes: &mut [MistakeRecord]) -> usize {
        let mut changed = 0;
        for mistake in mistakes.iter_mut() {
            if !mistake.is_resolved && self.auto_resolved.contains(&mistake.id) {
                mistake.is_resolved = true;
                changed += 1;
            }
        }
        changed
    }
}
