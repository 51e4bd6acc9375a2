use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::CalendarDay;

/// One actionable item. Field names serialize in camelCase to match the
/// persisted JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Opaque to the engine; the notification collaborator interprets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_time: Option<String>,

    #[serde(default)]
    pub estimated_minutes: u32,

    /// Only meaningful once the task is completed; see the statistics
    /// aggregator for how absent values are counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<u32>,

    /// The JST calendar day this task is scheduled for.
    pub target_date: CalendarDay,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Manual ordering key among same-day tasks.
    #[serde(default)]
    pub order: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        title: String,
        target_date: CalendarDay,
        estimated_minutes: u32,
        order: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            tags: vec![],
            alarm_time: None,
            estimated_minutes,
            actual_minutes: None,
            target_date,
            completed: false,
            completed_at: None,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mutation belongs to the collaborator layer; the filter and statistics
    /// engines only ever read tasks.
    pub fn mark_completed(&mut self, actual_minutes: Option<u32>, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(now);
        if actual_minutes.is_some() {
            self.actual_minutes = actual_minutes;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Today,
    Date,
    Archive,
}

/// The view specification the UI layer hands to the filter engine. The
/// engine never advances `view_date` on its own as wall-clock days roll
/// over; callers reset it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub view_date: CalendarDay,
    pub mode: FilterMode,
    pub show_completed: bool,
    pub show_archived: bool,
}

impl TaskFilter {
    /// The today-first default view: current JST day, completed hidden.
    #[must_use]
    pub fn today(now: DateTime<Utc>) -> Self {
        Self {
            view_date: CalendarDay::from_instant(now),
            mode: FilterMode::Today,
            show_completed: false,
            show_archived: false,
        }
    }

    #[must_use]
    pub fn for_date(day: CalendarDay) -> Self {
        Self {
            view_date: day,
            mode: FilterMode::Date,
            show_completed: false,
            show_archived: false,
        }
    }

    pub fn reset_to_today(&mut self, now: DateTime<Utc>) {
        self.view_date = CalendarDay::from_instant(now);
        self.mode = FilterMode::Today;
    }
}
