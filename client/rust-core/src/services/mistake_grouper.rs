use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::AGGREGATIONS_TOTAL;
use crate::models::MistakeRecord;
use crate::utils::time::elapsed_days;

/// Recency bucket shown on the mistakes screen. Declaration order is
/// newest first, which is also the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeekCategory {
    #[serde(rename = "This Week")]
    ThisWeek,
    #[serde(rename = "Last Week")]
    LastWeek,
    #[serde(rename = "2 Weeks Ago")]
    TwoWeeksAgo,
    #[serde(rename = "Earlier")]
    Earlier,
}

impl WeekCategory {
    pub fn for_timestamp(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(timestamp) = timestamp else {
            return WeekCategory::Earlier;
        };
        match elapsed_days(now, timestamp) {
            d if d < 7 => WeekCategory::ThisWeek,
            d if d < 14 => WeekCategory::LastWeek,
            d if d < 21 => WeekCategory::TwoWeeksAgo,
            _ => WeekCategory::Earlier,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeekCategory::ThisWeek => "This Week",
            WeekCategory::LastWeek => "Last Week",
            WeekCategory::TwoWeeksAgo => "2 Weeks Ago",
            WeekCategory::Earlier => "Earlier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedMistake {
    #[serde(flatten)]
    pub record: MistakeRecord,
    pub week_category: WeekCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeGroups {
    pub resolved: Vec<CategorizedMistake>,
    pub unresolved: Vec<CategorizedMistake>,
    pub by_week: BTreeMap<WeekCategory, Vec<CategorizedMistake>>,
}

impl MistakeGroups {
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    /// Unresolved mistakes in one bucket, in input order.
    pub fn unresolved_in(&self, category: WeekCategory) -> impl Iterator<Item = &CategorizedMistake> {
        self.by_week
            .get(&category)
            .into_iter()
            .flatten()
            .filter(|m| !m.record.is_resolved)
    }
}

/// Annotates mistakes with a recency bucket and splits them by resolution.
/// Input order is kept inside every output list; `is_resolved` is only read.
pub fn group_mistakes(records: &[MistakeRecord], now: DateTime<Utc>) -> MistakeGroups {
    AGGREGATIONS_TOTAL.with_label_values(&["mistakes"]).inc();

    let mut groups = MistakeGroups::default();
    for record in records {
        let categorized = CategorizedMistake {
            record: record.clone(),
            week_category: WeekCategory::for_timestamp(record.timestamp, now),
        };

        groups
            .by_week
            .entry(categorized.week_category)
            .or_default()
            .push(categorized.clone());

        if record.is_resolved {
            groups.resolved.push(categorized);
        } else {
            groups.unresolved.push(categorized);
        }
    }

    groups
}
