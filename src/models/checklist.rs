//! Per-trainee checklist flags and daily topic/notes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CHECKLIST_ITEMS;
use crate::codec::TRAINING_DAYS;
use crate::errors::AppError;

/// Completion flag for every canonical checklist item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChecklistState(BTreeMap<String, bool>);

impl ChecklistState {
    /// Build from stored flags. Items never stored read as not completed;
    /// stored items no longer in the canonical list are dropped.
    pub fn from_stored<I, S>(stored: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let mut items: BTreeMap<String, bool> = CHECKLIST_ITEMS
            .iter()
            .map(|item| (item.to_string(), false))
            .collect();
        for (item, completed) in stored {
            let item: String = item.into();
            if let Some(flag) = items.get_mut(&item) {
                *flag = completed;
            }
        }
        Self(items)
    }

    #[cfg(test)]
    pub fn is_completed(&self, item: &str) -> bool {
        self.0.get(item).copied().unwrap_or(false)
    }

    pub fn completed_count(&self) -> usize {
        self.0.values().filter(|done| **done).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for ChecklistState {
    fn default() -> Self {
        Self::from_stored(std::iter::empty::<(String, bool)>())
    }
}

/// Key of one daily entry: a day of the period (`day1`..`day14`) or a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayKey {
    Day(u32),
    Date(NaiveDate),
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayKey::Day(n) => write!(f, "day{}", n),
            DayKey::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for DayKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(n) = s.strip_prefix("day") {
            return match n.parse::<u32>() {
                Ok(n) if (1..=TRAINING_DAYS).contains(&n) => Ok(DayKey::Day(n)),
                _ => Err(AppError::Validation(format!(
                    "Day key {} must be day1..day{}",
                    s, TRAINING_DAYS
                ))),
            };
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(DayKey::Date)
            .map_err(|_| AppError::Validation(format!("Invalid day key: {}", s)))
    }
}

impl TryFrom<String> for DayKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

/// Free-text topic and notes for one training day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayEntry {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub notes: String,
}

/// Which half of a [`DayEntry`] to write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetailField {
    Topic,
    Notes,
}

/// All daily entries recorded for one trainee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DailyDetail(BTreeMap<DayKey, DayEntry>);

impl DailyDetail {
    #[cfg(test)]
    pub fn get(&self, key: &DayKey) -> Option<&DayEntry> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: DayKey, entry: DayEntry) {
        self.0.insert(key, entry);
    }

    #[cfg(test)]
    pub fn set(&mut self, key: DayKey, field: DetailField, value: impl Into<String>) {
        let entry = self.0.entry(key).or_default();
        match field {
            DetailField::Topic => entry.topic = value.into(),
            DetailField::Notes => entry.notes = value.into(),
        }
    }

    /// Entry for day `day` (1-based) of a period falling on `date`.
    /// A date-keyed entry wins over the day-numbered one.
    pub fn entry_for(&self, day: u32, date: NaiveDate) -> Option<&DayEntry> {
        self.0
            .get(&DayKey::Date(date))
            .or_else(|| self.0.get(&DayKey::Day(day)))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(DayKey, DayEntry)> for DailyDetail {
    fn from_iter<T: IntoIterator<Item = (DayKey, DayEntry)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Request body for `PUT /api/trainees/{name}/checklist`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetChecklistItemRequest {
    pub item: String,
    pub completed: bool,
}

/// Request body for `PUT /api/trainees/{name}/details`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDetailRequest {
    pub day_key: DayKey,
    pub field: DetailField,
    #[serde(default)]
    pub value: String,
}
