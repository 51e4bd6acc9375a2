use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::calendar::CalendarDay;
use crate::cli::Command;
use crate::filter::apply_filters;
use crate::format::{DateStyle, format_calendar_day};
use crate::render::Renderer;
use crate::stats::statistics_for;
use crate::store::Store;
use crate::task::{FilterMode, Task, TaskFilter};

#[instrument(skip(store, renderer, command))]
pub fn dispatch(
    store: &Store,
    renderer: &mut Renderer,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    // Today-first: a bare invocation is the today view.
    let command = command.unwrap_or(Command::List {
        date: None,
        all: false,
        archive: false,
    });
    debug!(?command, "dispatching command");

    match command {
        Command::Add {
            title,
            date,
            estimate,
            tags,
            note,
        } => add(store, now, title, date.as_deref(), estimate, tags, note),
        Command::List { date, all, archive } => {
            list(store, renderer, now, date.as_deref(), all, archive)
        }
        Command::Done { id, actual } => done(store, now, &id, actual),
        Command::Stats { date } => stats(store, renderer, now, date.as_deref()),
        Command::Week { date } => week(store, renderer, now, date.as_deref()),
        Command::Prefs {
            show_completed,
            show_archived,
        } => prefs(store, show_completed, show_archived),
        Command::Export => export(store, now),
    }
}

/// Resolve an optional day argument, falling back to today when absent or
/// unparsable. The fallback is the product behavior, not an error.
fn resolve_day(raw: Option<&str>, now: DateTime<Utc>) -> CalendarDay {
    match raw {
        None => CalendarDay::from_instant(now),
        Some(raw) => {
            let parsed = CalendarDay::parse(raw);
            if !parsed.is_valid() {
                warn!(raw, "unparsable day argument; using today");
            }
            parsed.resolve(now)
        }
    }
}

#[instrument(skip(store, now, title, tags, note))]
fn add(
    store: &Store,
    now: DateTime<Utc>,
    title: String,
    date: Option<&str>,
    estimate: u32,
    tags: Vec<String>,
    note: Option<String>,
) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        return Err(anyhow!("task title cannot be empty"));
    }

    let target = resolve_day(date, now);
    let mut tasks = store.load_tasks(now);

    let order = next_order(&tasks, target);
    let mut task = Task::new(title, target, estimate, order, now);
    task.tags = tags;
    task.description = note;

    info!(id = %task.id, target = %target, "adding task");
    println!("added {} ({})", task.title, target);

    tasks.push(task);
    store.save_tasks(&tasks)?;
    Ok(())
}

/// Next manual-order slot among tasks already scheduled for `day`.
fn next_order(tasks: &[Task], day: CalendarDay) -> i64 {
    tasks
        .iter()
        .filter(|task| task.target_date == day)
        .map(|task| task.order)
        .max()
        .map_or(0, |max| max + 1)
}

#[instrument(skip(store, renderer, now))]
fn list(
    store: &Store,
    renderer: &mut Renderer,
    now: DateTime<Utc>,
    date: Option<&str>,
    all: bool,
    archive: bool,
) -> anyhow::Result<()> {
    let tasks = store.load_tasks(now);
    let saved = store.load_filter_prefs();
    let today = CalendarDay::from_instant(now);

    let mut filter = TaskFilter::today(now);
    filter.show_completed = all || saved.show_completed;
    filter.show_archived = saved.show_archived;
    if archive {
        filter.mode = FilterMode::Archive;
    } else if let Some(raw) = date {
        filter.view_date = resolve_day(Some(raw), now);
        filter.mode = FilterMode::Date;
    }

    let view = apply_filters(&tasks, &filter);

    let heading = if archive {
        "アーカイブ".to_string()
    } else {
        format!(
            "{} ({})",
            format_calendar_day(filter.view_date, DateStyle::Long, today),
            format_calendar_day(filter.view_date, DateStyle::Relative, today)
        )
    };
    renderer.print_task_list(&heading, &view, today)
}

#[instrument(skip(store, now))]
fn done(store: &Store, now: DateTime<Utc>, id: &str, actual: Option<u32>) -> anyhow::Result<()> {
    let mut tasks = store.load_tasks(now);
    let task = find_task_mut(&mut tasks, id)?;

    if task.completed {
        return Err(anyhow!("task already completed: {}", task.title));
    }

    task.mark_completed(actual, now);
    info!(id = %task.id, "completed task");
    println!("completed {}", task.title);

    store.save_tasks(&tasks)?;
    Ok(())
}

/// Match a full id, or a unique prefix of one.
fn find_task_mut<'a>(tasks: &'a mut [Task], needle: &str) -> anyhow::Result<&'a mut Task> {
    if let Some(idx) = tasks.iter().position(|task| task.id == needle) {
        return Ok(&mut tasks[idx]);
    }

    let mut hits = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| task.id.starts_with(needle))
        .map(|(idx, _)| idx);
    let first = hits.next().ok_or_else(|| anyhow!("no task matches id: {needle}"))?;
    if hits.next().is_some() {
        return Err(anyhow!("id prefix is ambiguous: {needle}"));
    }
    Ok(&mut tasks[first])
}

#[instrument(skip(store, renderer, now))]
fn stats(
    store: &Store,
    renderer: &mut Renderer,
    now: DateTime<Utc>,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let tasks = store.load_tasks(now);
    let day = resolve_day(date, now);
    let stats = statistics_for(&tasks, day);
    renderer.print_statistics(&stats, CalendarDay::from_instant(now))
}

#[instrument(skip(store, renderer, now))]
fn week(
    store: &Store,
    renderer: &mut Renderer,
    now: DateTime<Utc>,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let tasks = store.load_tasks(now);
    let start = resolve_day(date, now).week_start();
    let days = CalendarDay::range(start, start.add_days(6));

    let rows: Vec<_> = days
        .into_iter()
        .map(|day| statistics_for(&tasks, day))
        .collect();
    renderer.print_week(&rows, CalendarDay::from_instant(now))
}

#[instrument(skip(store))]
fn prefs(
    store: &Store,
    show_completed: Option<bool>,
    show_archived: Option<bool>,
) -> anyhow::Result<()> {
    let mut prefs = store.load_filter_prefs();
    if let Some(value) = show_completed {
        prefs.show_completed = value;
    }
    if let Some(value) = show_archived {
        prefs.show_archived = value;
    }
    store.save_filter_prefs(prefs)?;

    println!("show-completed {}", prefs.show_completed);
    println!("show-archived  {}", prefs.show_archived);
    Ok(())
}

#[instrument(skip(store, now))]
fn export(store: &Store, now: DateTime<Utc>) -> anyhow::Result<()> {
    let tasks = store.load_tasks(now);
    let payload = serde_json::to_string_pretty(&tasks)?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{find_task_mut, next_order, resolve_day};
    use crate::calendar::CalendarDay;
    use crate::task::Task;

    fn day(raw: &str) -> CalendarDay {
        CalendarDay::parse(raw).day().expect("valid test day")
    }

    #[test]
    fn resolve_day_prefers_valid_input_and_falls_back_otherwise() {
        let now = Utc
            .with_ymd_and_hms(2025, 7, 21, 0, 0, 0)
            .single()
            .expect("valid instant");
        assert_eq!(resolve_day(Some("2025-07-01"), now), day("2025-07-01"));
        assert_eq!(resolve_day(Some("bogus"), now), day("2025-07-21"));
        assert_eq!(resolve_day(None, now), day("2025-07-21"));
    }

    #[test]
    fn next_order_is_scoped_to_the_day() {
        let now = Utc
            .with_ymd_and_hms(2025, 7, 21, 0, 0, 0)
            .single()
            .expect("valid instant");
        let mut a = Task::new("a".to_string(), day("2025-07-21"), 0, 0, now);
        a.order = 3;
        let b = Task::new("b".to_string(), day("2025-07-22"), 0, 9, now);

        let tasks = vec![a, b];
        assert_eq!(next_order(&tasks, day("2025-07-21")), 4);
        assert_eq!(next_order(&tasks, day("2025-07-23")), 0);
    }

    #[test]
    fn id_lookup_accepts_exact_and_unique_prefix() {
        let now = Utc
            .with_ymd_and_hms(2025, 7, 21, 0, 0, 0)
            .single()
            .expect("valid instant");
        let mut tasks = vec![
            Task::new("a".to_string(), day("2025-07-21"), 0, 0, now),
            Task::new("b".to_string(), day("2025-07-21"), 0, 1, now),
        ];
        tasks[0].id = "abc123".to_string();
        tasks[1].id = "abd456".to_string();

        assert_eq!(find_task_mut(&mut tasks, "abc123").expect("exact").title, "a");
        assert_eq!(find_task_mut(&mut tasks, "abd").expect("prefix").title, "b");
        assert!(find_task_mut(&mut tasks, "ab").is_err());
        assert!(find_task_mut(&mut tasks, "zzz").is_err());
    }
}
