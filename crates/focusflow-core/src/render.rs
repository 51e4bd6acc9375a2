use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::calendar::CalendarDay;
use crate::config::Config;
use crate::format::{DateStyle, format_calendar_day};
use crate::stats::DateStatistics;
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self { color: cfg.ui.color }
    }

    #[tracing::instrument(skip(self, tasks, today))]
    pub fn print_task_list(
        &mut self,
        heading: &str,
        tasks: &[Task],
        today: CalendarDay,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{heading}")?;

        if tasks.is_empty() {
            writeln!(out, "(no tasks)")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Day".to_string(),
            "Est".to_string(),
            "Act".to_string(),
            "".to_string(),
            "Title".to_string(),
            "Tags".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = self.paint(short_id(&task.id), "33");
            let day = format_calendar_day(task.target_date, DateStyle::Short, today);
            let est = format!("{}m", task.estimated_minutes);
            let act = task
                .actual_minutes
                .map(|minutes| format!("{minutes}m"))
                .unwrap_or_default();
            let state = if task.completed {
                self.paint("✓", "32")
            } else {
                " ".to_string()
            };
            let tags = task
                .tags
                .iter()
                .map(|tag| format!("+{tag}"))
                .collect::<Vec<_>>()
                .join(" ");

            rows.push(vec![id, day, est, act, state, task.title.clone(), tags]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, stats, today))]
    pub fn print_statistics(
        &mut self,
        stats: &DateStatistics,
        today: CalendarDay,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(
            out,
            "{} ({})",
            format_calendar_day(stats.date, DateStyle::Long, today),
            format_calendar_day(stats.date, DateStyle::Relative, today)
        )?;
        writeln!(out, "tasks      {}/{}", stats.completed_tasks, stats.total_tasks)?;
        writeln!(out, "progress   {}%", stats.completion_percentage)?;
        writeln!(out, "estimated  {}m", stats.total_estimated_minutes)?;
        if let Some(actual) = stats.total_actual_minutes {
            writeln!(out, "actual     {actual}m")?;
        }
        if let Some(efficiency) = stats.efficiency() {
            writeln!(out, "efficiency {}", efficiency.label())?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, week, today))]
    pub fn print_week(
        &mut self,
        week: &[DateStatistics],
        today: CalendarDay,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Day".to_string(),
            "Done".to_string(),
            "Progress".to_string(),
            "Est".to_string(),
            "Act".to_string(),
        ];

        let mut rows = Vec::with_capacity(week.len());
        for stats in week {
            let day = format_calendar_day(stats.date, DateStyle::Short, today);
            let day = if stats.date == today {
                self.paint(&day, "36")
            } else {
                day
            };

            rows.push(vec![
                day,
                format!("{}/{}", stats.completed_tasks, stats.total_tasks),
                format!("{}%", stats.completion_percentage),
                format!("{}m", stats.total_estimated_minutes),
                stats
                    .total_actual_minutes
                    .map(|minutes| format!("{minutes}m"))
                    .unwrap_or_default(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
