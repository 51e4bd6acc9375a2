use std::cmp::Ordering;

use tracing::trace;

use crate::calendar::CalendarDay;
use crate::task::{FilterMode, Task, TaskFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionFilter {
    Completed,
    Incomplete,
    All,
}

/// Produce the filtered, deterministically ordered view of `tasks` for one
/// filter specification. Pure: the input collection and every task in it
/// stay untouched, and re-filtering an already-filtered set is a no-op.
#[must_use]
pub fn apply_filters(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| match filter.mode {
            FilterMode::Today | FilterMode::Date => task.target_date == filter.view_date,
            // Archive mode has no date scoping; only the completion toggle
            // applies. See DESIGN.md for the call on its semantics.
            FilterMode::Archive => true,
        })
        .filter(|task| filter.show_completed || !task.completed)
        .cloned()
        .collect();

    out.sort_by(display_order);
    trace!(
        input = tasks.len(),
        output = out.len(),
        view_date = %filter.view_date,
        mode = ?filter.mode,
        "applied task filters"
    );
    out
}

/// Tasks scheduled for exactly `day`, in input order.
#[must_use]
pub fn filter_by_date(tasks: &[Task], day: CalendarDay) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.target_date == day)
        .cloned()
        .collect()
}

/// Tasks matching a completion state, in input order.
#[must_use]
pub fn filter_by_completion(tasks: &[Task], mode: CompletionFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| match mode {
            CompletionFilter::Completed => task.completed,
            CompletionFilter::Incomplete => !task.completed,
            CompletionFilter::All => true,
        })
        .cloned()
        .collect()
}

/// Total display order: incomplete before completed, then shortest estimate
/// first, then the manual order key, then creation time.
fn display_order(a: &Task, b: &Task) -> Ordering {
    (a.completed)
        .cmp(&b.completed)
        .then_with(|| a.estimated_minutes.cmp(&b.estimated_minutes))
        .then_with(|| a.order.cmp(&b.order))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{CompletionFilter, apply_filters, filter_by_completion, filter_by_date};
    use crate::calendar::CalendarDay;
    use crate::task::{FilterMode, Task, TaskFilter};

    fn instant(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 21, hour, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn day(raw: &str) -> CalendarDay {
        CalendarDay::parse(raw).day().expect("valid test day")
    }

    fn task(title: &str, target: &str, estimate: u32, completed: bool, hour: u32) -> Task {
        let mut t = Task::new(title.to_string(), day(target), estimate, 0, instant(hour));
        if completed {
            t.mark_completed(None, instant(hour + 1));
        }
        t
    }

    #[test]
    fn today_view_hides_completed_and_sorts_by_estimate() {
        let tasks = vec![
            task("a", "2025-07-21", 60, false, 0),
            task("b", "2025-07-21", 30, false, 1),
            task("done", "2025-07-21", 90, true, 2),
            task("other-day", "2025-07-22", 10, false, 3),
        ];

        let filter = TaskFilter::today(instant(4));
        let view = apply_filters(&tasks, &filter);

        let titles: Vec<&str> = view.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["b", "a"]);
    }

    #[test]
    fn show_completed_keeps_both_states_with_incomplete_first() {
        let tasks = vec![
            task("done-short", "2025-07-21", 10, true, 0),
            task("open-long", "2025-07-21", 90, false, 1),
            task("open-short", "2025-07-21", 15, false, 2),
        ];

        let mut filter = TaskFilter::today(instant(4));
        filter.show_completed = true;
        let view = apply_filters(&tasks, &filter);

        let titles: Vec<&str> = view.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["open-short", "open-long", "done-short"]);
    }

    #[test]
    fn equal_estimates_fall_back_to_order_then_creation_time() {
        let mut first = task("first", "2025-07-21", 30, false, 0);
        let mut second = task("second", "2025-07-21", 30, false, 1);
        first.order = 2;
        second.order = 1;

        let filter = TaskFilter::today(instant(4));
        let view = apply_filters(&[first, second], &filter);
        let titles: Vec<&str> = view.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);

        let twin_a = task("twin-a", "2025-07-21", 30, false, 0);
        let twin_b = task("twin-b", "2025-07-21", 30, false, 1);
        let view = apply_filters(&[twin_b, twin_a.clone()], &filter);
        assert_eq!(view[0].title, twin_a.title);
    }

    #[test]
    fn filtering_is_idempotent_and_does_not_mutate_input() {
        let tasks = vec![
            task("a", "2025-07-21", 60, false, 0),
            task("b", "2025-07-21", 30, true, 1),
            task("c", "2025-07-22", 5, false, 2),
        ];
        let before = tasks.clone();

        let mut filter = TaskFilter::today(instant(4));
        filter.show_completed = true;

        let once = apply_filters(&tasks, &filter);
        let twice = apply_filters(&once, &filter);
        assert_eq!(once, twice);
        assert_eq!(tasks, before);
    }

    #[test]
    fn archive_mode_spans_all_days() {
        let tasks = vec![
            task("past", "2025-07-01", 30, true, 0),
            task("today", "2025-07-21", 30, false, 1),
        ];

        let filter = TaskFilter {
            view_date: day("2025-07-21"),
            mode: FilterMode::Archive,
            show_completed: true,
            show_archived: true,
        };
        assert_eq!(apply_filters(&tasks, &filter).len(), 2);
    }

    #[test]
    fn composable_primitives_filter_independently() {
        let tasks = vec![
            task("a", "2025-07-21", 60, false, 0),
            task("b", "2025-07-22", 30, true, 1),
            task("c", "2025-07-21", 10, true, 2),
        ];

        assert_eq!(filter_by_date(&tasks, day("2025-07-21")).len(), 2);
        assert_eq!(filter_by_date(&tasks, day("2025-07-23")).len(), 0);

        assert_eq!(filter_by_completion(&tasks, CompletionFilter::Completed).len(), 2);
        assert_eq!(filter_by_completion(&tasks, CompletionFilter::Incomplete).len(), 1);
        assert_eq!(filter_by_completion(&tasks, CompletionFilter::All).len(), 3);
    }
}
