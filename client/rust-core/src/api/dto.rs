//! Raw backend response shapes and their normalization into the canonical
//! models. Nothing past this module sees the inconsistent forms.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Module, ModuleCompletion};

/// Per-module count as the backend sends it: older endpoints return the bare
/// completed count, newer ones an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawModuleCount {
    Detailed {
        #[serde(default)]
        completed: u32,
        #[serde(default)]
        total: Option<u32>,
    },
    Count(u32),
}

impl RawModuleCount {
    fn completed(&self) -> u32 {
        match self {
            RawModuleCount::Detailed { completed, .. } => *completed,
            RawModuleCount::Count(count) => *count,
        }
    }

    fn total(&self) -> Option<u32> {
        match self {
            RawModuleCount::Detailed { total, .. } => *total,
            RawModuleCount::Count(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProgressOverview {
    #[serde(alias = "lessonsByType", default)]
    pub type_data: HashMap<String, RawModuleCount>,
}

/// Per-module completion with curriculum sizes filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOverview {
    pub lessons_by_type: BTreeMap<Module, ModuleCompletion>,
}

impl ProgressOverview {
    pub fn totals(&self) -> HashMap<Module, u32> {
        self.lessons_by_type
            .iter()
            .map(|(module, completion)| (*module, completion.total))
            .collect()
    }
}

impl RawProgressOverview {
    /// Totals missing from the response come from `fallback_totals`; keys
    /// that are not a known module are dropped.
    pub fn normalize(self, fallback_totals: &HashMap<Module, u32>) -> ProgressOverview {
        let mut lessons_by_type: BTreeMap<Module, ModuleCompletion> = fallback_totals
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

        for (key, raw) in self.type_data {
            let module = match key.parse::<Module>() {
                Ok(module) => module,
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Skipping unknown module in overview");
                    continue;
                }
            };
            let entry = lessons_by_type.entry(module).or_default();
            entry.completed = raw.completed();
            if let Some(total) = raw.total() {
                entry.total = total;
            }
        }

        ProgressOverview { lessons_by_type }
    }
}

/// List endpoints answer either `[...]` or `{"data": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawList<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> RawList<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            RawList::Bare(items) | RawList::Wrapped { data: items } => items,
        }
    }
}

/// Single-object endpoints may wrap the payload in `data` as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawItem<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> RawItem<T> {
    pub fn into_inner(self) -> T {
        match self {
            RawItem::Wrapped { data } | RawItem::Bare(data) => data,
        }
    }
}
