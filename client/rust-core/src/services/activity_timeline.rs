use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::AGGREGATIONS_TOTAL;
use crate::models::{AchievementRecord, ProgressRecord, QuizResult};
use crate::utils::time::elapsed_days;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Lesson,
    Quiz,
    Achievement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub subtitle: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub date_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityGroup {
    pub date_label: String,
    pub entries: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTimeline {
    pub entries: Vec<ActivityEntry>,
    pub groups: Vec<ActivityGroup>,
}

pub const UNKNOWN_DATE_LABEL: &str = "Unknown";

/// `Today`, `Yesterday` or `N days ago`. Deliberately coarser than the
/// mistake buckets.
pub fn date_label(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match timestamp.map(|ts| elapsed_days(now, ts)) {
        None => UNKNOWN_DATE_LABEL.to_string(),
        Some(d) if d <= 0 => "Today".to_string(),
        Some(1) => "Yesterday".to_string(),
        Some(d) => format!("{} days ago", d),
    }
}

/// Merges lesson completions, quiz results and achievements into one feed,
/// newest first. Ties keep input order (lessons, then quizzes, then
/// achievements); undated entries go last.
pub fn build_timeline(
    progress: &[ProgressRecord],
    quizzes: &[QuizResult],
    achievements: &[AchievementRecord],
    now: DateTime<Utc>,
    limit: Option<usize>,
) -> ActivityTimeline {
    AGGREGATIONS_TOTAL.with_label_values(&["timeline"]).inc();

    let mut entries: Vec<ActivityEntry> = progress
        .iter()
        .filter(|record| record.is_completed())
        .map(|record| lesson_entry(record, now))
        .chain(quizzes.iter().map(|quiz| quiz_entry(quiz, now)))
        .chain(achievements.iter().map(|a| achievement_entry(a, now)))
        .collect();

    // sort_by is stable; Option orders None below Some.
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    let mut groups: Vec<ActivityGroup> = Vec::new();
    for entry in &entries {
        match groups.last_mut() {
            Some(group) if group.date_label == entry.date_label => {
                group.entries.push(entry.clone())
            }
            _ => groups.push(ActivityGroup {
                date_label: entry.date_label.clone(),
                entries: vec![entry.clone()],
            }),
        }
    }

    ActivityTimeline { entries, groups }
}

fn lesson_entry(record: &ProgressRecord, now: DateTime<Utc>) -> ActivityEntry {
    let timestamp = record.completion_time();
    ActivityEntry {
        id: format!("lesson:{}:{}:{}", record.module.as_str(), record.level_id, record.lesson_id),
        activity_type: ActivityType::Lesson,
        title: format!("Completed {} lesson {}", record.module.as_str(), record.lesson_id),
        subtitle: format!("Accuracy {:.0}%", record.accuracy),
        timestamp,
        date_label: date_label(timestamp, now),
    }
}

fn quiz_entry(quiz: &QuizResult, now: DateTime<Utc>) -> ActivityEntry {
    let title = match &quiz.title {
        Some(title) => format!("{} {}", if quiz.passed { "Passed" } else { "Attempted" }, title),
        None if quiz.passed => "Passed a quiz".to_string(),
        None => "Attempted a quiz".to_string(),
    };
    let mut subtitle = format!(
        "Score {}/{} ({:.0}%)",
        quiz.score, quiz.total_questions, quiz.percentage
    );
    if quiz.coins_earned > 0 {
        subtitle.push_str(&format!(" · +{} coins", quiz.coins_earned));
    }

    ActivityEntry {
        id: format!("quiz:{}", quiz.quiz_id),
        activity_type: ActivityType::Quiz,
        title,
        subtitle,
        timestamp: quiz.completed_at,
        date_label: date_label(quiz.completed_at, now),
    }
}

fn achievement_entry(achievement: &AchievementRecord, now: DateTime<Utc>) -> ActivityEntry {
    ActivityEntry {
        id: format!("achievement:{}", achievement.id),
        activity_type: ActivityType::Achievement,
        title: achievement.title.clone(),
        subtitle: achievement.description.clone(),
        timestamp: achievement.earned_at,
        date_label: date_label(achievement.earned_at, now),
    }
}
