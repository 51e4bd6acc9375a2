use serde::Serialize;
use tracing::trace;

use crate::calendar::CalendarDay;
use crate::filter::filter_by_date;
use crate::task::Task;

/// Aggregates for one calendar day. Always recomputed from the task
/// collection; never cached or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateStatistics {
    pub date: CalendarDay,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub total_estimated_minutes: u32,
    /// Sum of `actual_minutes` over every matched task, absent treated as
    /// zero; `None` when no matched task carries the field at all. Incomplete
    /// tasks are not expected to carry it, so in-progress time is simply not
    /// counted. Known approximation, kept as specified.
    pub total_actual_minutes: Option<u32>,
    /// Rounded percentage; 0 for an empty day.
    pub completion_percentage: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Efficiency {
    High,
    Normal,
    NeedsImprovement,
}

impl Efficiency {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high efficiency",
            Self::Normal => "normal",
            Self::NeedsImprovement => "needs improvement",
        }
    }
}

#[must_use]
pub fn statistics_for(tasks: &[Task], day: CalendarDay) -> DateStatistics {
    let matched = filter_by_date(tasks, day);

    let total_tasks = matched.len();
    let completed_tasks = matched.iter().filter(|t| t.completed).count();
    let total_estimated_minutes = matched.iter().map(|t| t.estimated_minutes).sum();

    let total_actual_minutes = if matched.iter().any(|t| t.actual_minutes.is_some()) {
        Some(matched.iter().filter_map(|t| t.actual_minutes).sum())
    } else {
        None
    };

    let completion_percentage = if total_tasks == 0 {
        0
    } else {
        (completed_tasks as f64 / total_tasks as f64 * 100.0).round() as u8
    };

    let stats = DateStatistics {
        date: day,
        total_tasks,
        completed_tasks,
        total_estimated_minutes,
        total_actual_minutes,
        completion_percentage,
    };
    trace!(date = %day, ?stats, "computed day statistics");
    stats
}

impl DateStatistics {
    /// Actual versus estimated time for the day. Undefined without an
    /// estimate or without any recorded actual minutes.
    #[must_use]
    pub fn efficiency(&self) -> Option<Efficiency> {
        if self.total_estimated_minutes == 0 {
            return None;
        }
        let actual = self.total_actual_minutes?;
        let ratio = f64::from(actual) / f64::from(self.total_estimated_minutes);
        Some(if ratio <= 0.9 {
            Efficiency::High
        } else if ratio <= 1.1 {
            Efficiency::Normal
        } else {
            Efficiency::NeedsImprovement
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{Efficiency, statistics_for};
    use crate::calendar::CalendarDay;
    use crate::task::Task;

    fn instant(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 21, hour, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn day(raw: &str) -> CalendarDay {
        CalendarDay::parse(raw).day().expect("valid test day")
    }

    fn task(target: &str, estimate: u32, actual: Option<u32>, completed: bool) -> Task {
        let mut t = Task::new("t".to_string(), day(target), estimate, 0, instant(0));
        if completed {
            t.mark_completed(actual, instant(2));
        } else {
            t.actual_minutes = actual;
        }
        t
    }

    #[test]
    fn totals_cover_counts_minutes_and_percentage() {
        let tasks = vec![
            task("2025-07-21", 60, None, false),
            task("2025-07-21", 30, Some(25), true),
            task("2025-07-22", 99, Some(99), true),
        ];

        let stats = statistics_for(&tasks, day("2025-07-21"));
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.total_estimated_minutes, 90);
        assert_eq!(stats.total_actual_minutes, Some(25));
        assert_eq!(stats.completion_percentage, 50);
    }

    #[test]
    fn empty_day_yields_zeroes_not_division_errors() {
        let stats = statistics_for(&[], day("2025-07-21"));
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completed_tasks, 0);
        assert_eq!(stats.total_estimated_minutes, 0);
        assert_eq!(stats.total_actual_minutes, None);
        assert_eq!(stats.completion_percentage, 0);
        assert_eq!(stats.efficiency(), None);
    }

    #[test]
    fn completion_percentage_rounds() {
        let tasks = vec![
            task("2025-07-21", 10, None, true),
            task("2025-07-21", 10, None, false),
            task("2025-07-21", 10, None, false),
        ];
        // 1/3 -> 33.33 rounds down.
        assert_eq!(statistics_for(&tasks, day("2025-07-21")).completion_percentage, 33);

        let tasks = vec![
            task("2025-07-21", 10, None, true),
            task("2025-07-21", 10, None, true),
            task("2025-07-21", 10, None, false),
        ];
        // 2/3 -> 66.67 rounds up.
        assert_eq!(statistics_for(&tasks, day("2025-07-21")).completion_percentage, 67);
    }

    #[test]
    fn efficiency_bands_follow_the_ratio_thresholds() {
        let case = |estimate: u32, actual: u32| {
            let tasks = vec![task("2025-07-21", estimate, Some(actual), true)];
            statistics_for(&tasks, day("2025-07-21")).efficiency()
        };

        assert_eq!(case(100, 90), Some(Efficiency::High));
        assert_eq!(case(100, 91), Some(Efficiency::Normal));
        assert_eq!(case(100, 110), Some(Efficiency::Normal));
        assert_eq!(case(100, 111), Some(Efficiency::NeedsImprovement));
    }

    #[test]
    fn efficiency_is_undefined_without_estimates_or_actuals() {
        let no_estimate = vec![task("2025-07-21", 0, Some(30), true)];
        assert_eq!(statistics_for(&no_estimate, day("2025-07-21")).efficiency(), None);

        let no_actuals = vec![task("2025-07-21", 30, None, true)];
        let stats = statistics_for(&no_actuals, day("2025-07-21"));
        assert_eq!(stats.total_actual_minutes, None);
        assert_eq!(stats.efficiency(), None);
    }

    #[test]
    fn actual_minutes_on_incomplete_tasks_still_count() {
        // Preserved behavior: the sum spans all matched tasks regardless of
        // completion state.
        let tasks = vec![
            task("2025-07-21", 60, Some(20), false),
            task("2025-07-21", 30, Some(25), true),
        ];
        let stats = statistics_for(&tasks, day("2025-07-21"));
        assert_eq!(stats.total_actual_minutes, Some(45));
    }

    #[test]
    fn labels_render_for_reporting() {
        assert_eq!(Efficiency::High.label(), "high efficiency");
        assert_eq!(Efficiency::NeedsImprovement.label(), "needs improvement");
    }
}
