use rand::Rng;
use uuid::Uuid;

use crate::config::PracticeConfig;
use crate::models::{MistakeSeverity, Module, PracticeSubmission};

/// Attempts scoring below this are recorded as mistakes by the backend.
pub const MISTAKE_ACCURACY_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct RecitationAttempt {
    pub module: Module,
    pub level_id: String,
    pub lesson_id: String,
    pub duration_secs: u64,
}

/// Turns a recorded recitation into a 0..=100 accuracy.
pub trait RecitationScorer: Send + Sync {
    fn score(&self, attempt: &RecitationAttempt) -> f64;
}

/// Stand-in until a pronunciation model exists: uniform random accuracy
/// within the configured bounds.
pub struct PlaceholderScorer {
    min_accuracy: u8,
    max_accuracy: u8,
}

impl PlaceholderScorer {
    pub fn new(config: &PracticeConfig) -> Self {
        let max_accuracy = config.max_accuracy.min(100);
        Self {
            min_accuracy: config.min_accuracy.min(max_accuracy),
            max_accuracy,
        }
    }
}

impl RecitationScorer for PlaceholderScorer {
    fn score(&self, _attempt: &RecitationAttempt) -> f64 {
        f64::from(rand::rng().random_range(self.min_accuracy..=self.max_accuracy))
    }
}

pub fn needs_review(accuracy: f64) -> bool {
    accuracy < MISTAKE_ACCURACY_THRESHOLD
}

pub fn prepare_submission(attempt: &RecitationAttempt, accuracy: f64) -> PracticeSubmission {
    let accuracy = accuracy.clamp(0.0, 100.0);
    let review = needs_review(accuracy);
    PracticeSubmission {
        idempotency_key: Uuid::new_v4().to_string(),
        module: attempt.module,
        level_id: attempt.level_id.clone(),
        lesson_id: attempt.lesson_id.clone(),
        accuracy,
        time_spent: attempt.duration_secs,
        needs_review: review,
        suggested_severity: review.then(|| MistakeSeverity::for_accuracy(accuracy)),
    }
}

/// Scores the attempt with `scorer` and builds the submission for it.
pub fn score_attempt(scorer: &dyn RecitationScorer, attempt: &RecitationAttempt) -> PracticeSubmission {
    let accuracy = scorer.score(attempt);
    tracing::debug!(
        module = attempt.module.as_str(),
        lesson_id = %attempt.lesson_id,
        accuracy,
        "Scored recitation attempt"
    );
    prepare_submission(attempt, accuracy)
}
