use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::calendar::CalendarDay;
use crate::task::Task;

/// A task record before the `targetDate` field existed. Timestamps are kept
/// as raw strings so a single corrupt one degrades per-field instead of
/// dropping the whole record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alarm_time: Option<String>,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The typed decision point for raw persisted records: current schema,
/// legacy schema, or unusable.
#[derive(Debug, Clone)]
pub enum DecodedRecord {
    Current(Task),
    Legacy(LegacyRecord),
    Invalid,
}

pub fn decode_record(raw: &Value) -> DecodedRecord {
    if !raw.is_object() {
        return DecodedRecord::Invalid;
    }

    if raw.get("targetDate").is_some() {
        return match serde_json::from_value::<Task>(raw.clone()) {
            Ok(task) => DecodedRecord::Current(task),
            Err(err) => {
                warn!(error = %err, "dropping undecodable current-schema record");
                DecodedRecord::Invalid
            }
        };
    }

    match serde_json::from_value::<LegacyRecord>(raw.clone()) {
        Ok(legacy) => DecodedRecord::Legacy(legacy),
        Err(err) => {
            warn!(error = %err, "dropping record without id/title");
            DecodedRecord::Invalid
        }
    }
}

/// True iff at least one well-formed record still lacks `targetDate`.
/// Unusable records never trigger a migration on their own.
#[must_use]
pub fn needs_migration(records: &[Value]) -> bool {
    records
        .iter()
        .any(|raw| matches!(decode_record(raw), DecodedRecord::Legacy(_)))
}

/// Upgrade a raw record collection to the current schema. Current records
/// pass through untouched, legacy records gain a `target_date` derived from
/// their creation instant, and unusable records are dropped. Running the
/// output back through is a no-op.
pub fn migrate(records: &[Value], now: DateTime<Utc>) -> Vec<Task> {
    let mut out = Vec::with_capacity(records.len());
    let mut upgraded = 0usize;
    let mut dropped = 0usize;

    for raw in records {
        match decode_record(raw) {
            DecodedRecord::Current(task) => out.push(task),
            DecodedRecord::Legacy(legacy) => {
                upgraded += 1;
                out.push(upgrade_legacy(legacy, now));
            }
            DecodedRecord::Invalid => dropped += 1,
        }
    }

    if upgraded > 0 || dropped > 0 {
        info!(total = records.len(), upgraded, dropped, "migrated legacy task records");
    } else {
        debug!(total = records.len(), "task records already on current schema");
    }
    out
}

fn upgrade_legacy(legacy: LegacyRecord, now: DateTime<Utc>) -> Task {
    let created_at = parse_instant(legacy.created_at.as_deref());
    let updated_at = parse_instant(legacy.updated_at.as_deref());

    // The legacy schema has no authoritative completion timestamp; the last
    // update is the best available provenance.
    let completed_at = if legacy.completed {
        updated_at.or(created_at)
    } else {
        None
    };

    let target_date = created_at
        .map(CalendarDay::from_instant)
        .unwrap_or_else(|| CalendarDay::from_instant(now));

    Task {
        id: legacy.id,
        title: legacy.title,
        description: legacy.description,
        tags: legacy.tags,
        alarm_time: legacy.alarm_time,
        estimated_minutes: legacy.estimated_minutes,
        actual_minutes: None,
        target_date,
        completed: legacy.completed,
        completed_at,
        order: legacy.order,
        created_at: created_at.unwrap_or(now),
        updated_at: updated_at.or(created_at).unwrap_or(now),
    }
}

fn parse_instant(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(err) => {
            warn!(raw, error = %err, "ignoring unparsable legacy timestamp");
            None
        }
    }
}
