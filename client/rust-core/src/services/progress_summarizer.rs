use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::AGGREGATIONS_TOTAL;
use crate::models::{Module, ModuleCompletion, ProgressRecord};
use crate::utils::time::calendar_day;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Longest daily series produced; larger lookbacks are capped to it.
pub const MAX_LOOKBACK_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub lessons_by_type: BTreeMap<Module, ModuleCompletion>,
    pub weekly_progress: Vec<DailyProgress>,
    pub accuracy: f64,
    pub current_level: String,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub lessons_completed: u32,
    pub accuracy: f64,
}

/// Summarizes one learner's progress records.
///
/// `curriculum_totals` supplies lesson counts per module, which progress rows
/// alone cannot tell. The daily series always holds exactly `lookback_days`
/// entries ending on `now`'s calendar day, in `now`'s time zone. The window
/// is capped at `MAX_LOOKBACK_DAYS` and never reaches before the earliest
/// representable date.
pub fn summarize_progress<Tz: TimeZone>(
    records: &[ProgressRecord],
    curriculum_totals: &HashMap<Module, u32>,
    lookback_days: u32,
    now: &DateTime<Tz>,
) -> ProgressSummary {
    AGGREGATIONS_TOTAL.with_label_values(&["progress"]).inc();

    ProgressSummary {
        lessons_by_type: lessons_by_type(records, curriculum_totals),
        weekly_progress: daily_series(records, lookback_days, now),
        accuracy: mean_accuracy(records.iter().filter(|r| r.is_completed())),
        current_level: records
            .iter()
            .max_by_key(|r| r.last_accessed_at)
            .map(|r| r.level_id.clone())
            .unwrap_or_default(),
        last_activity: records.iter().map(|r| r.last_accessed_at).max(),
    }
}

fn lessons_by_type(
    records: &[ProgressRecord],
    curriculum_totals: &HashMap<Module, u32>,
) -> BTreeMap<Module, ModuleCompletion> {
    let mut by_module: BTreeMap<Module, ModuleCompletion> = curriculum_totals
        .iter()
        .map(|(module, total)| {
            (
                *module,
                ModuleCompletion {
                    completed: 0,
                    total: *total,
                },
            )
        })
        .collect();

    for record in records {
        let entry = by_module.entry(record.module).or_default();
        if record.is_completed() {
            entry.completed += 1;
        }
    }

    by_module
}

fn daily_series<Tz: TimeZone>(
    records: &[ProgressRecord],
    lookback_days: u32,
    now: &DateTime<Tz>,
) -> Vec<DailyProgress> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut by_day: HashMap<NaiveDate, Vec<&ProgressRecord>> = HashMap::new();
    for record in records.iter().filter(|r| r.is_completed()) {
        by_day
            .entry(calendar_day(&record.last_accessed_at, &tz))
            .or_default()
            .push(record);
    }

    (0..lookback_days.min(MAX_LOOKBACK_DAYS))
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| {
            let day_records = by_day.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            DailyProgress {
                date,
                lessons_completed: day_records.len() as u32,
                accuracy: mean_accuracy(day_records.iter().copied()),
            }
        })
        .collect()
}

fn mean_accuracy<'a>(records: impl Iterator<Item = &'a ProgressRecord>) -> f64 {
    let (sum, count) = records.fold((0.0, 0u32), |(sum, count), r| (sum + r.accuracy, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}
