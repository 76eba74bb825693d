use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, Datelike, Utc};
use unicode_width::UnicodeWidthStr;

use crate::activity::ActivityLog;
use crate::analytics::AnalyticsSnapshot;
use crate::config::Config;
use crate::datetime::to_project_date;
use crate::task::Task;
use crate::view::{View, ViewCounts};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.color.clone().unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks, now))]
    pub fn print_task_list(
        &mut self,
        view: View,
        tasks: &[&Task],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{} — {}", view.label(), view.description())?;
        writeln!(out)?;

        if tasks.is_empty() {
            let message = match view {
                View::Today => "No tasks due today.",
                View::Upcoming => "No upcoming tasks in the next 7 days.",
                View::Completed => "No completed tasks yet.",
                View::All => "No tasks found.",
            };
            writeln!(out, "{message}")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Status".to_string(),
            "Pri".to_string(),
            "Due".to_string(),
            "Est".to_string(),
            "Tags".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = self.paint(&short_id(task), "33");

            let due = task
                .due_date
                .map(|due| relative_due_label(due, now))
                .unwrap_or_default();
            let due = if task.is_overdue(now) {
                self.paint(&due, "31")
            } else {
                due
            };

            let est = if task.actual_time > 0 {
                format!(
                    "{} / {}",
                    format_minutes(task.estimated_time),
                    format_minutes(task.actual_time)
                )
            } else {
                format_minutes(task.estimated_time)
            };

            let tags = task
                .tags
                .iter()
                .map(|tag| format!("+{tag}"))
                .collect::<Vec<_>>()
                .join(" ");

            rows.push(vec![
                id,
                task.title.clone(),
                task.status.label().to_string(),
                task.priority.label().to_string(),
                due,
                est,
                tags,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, counts))]
    pub fn print_counts(&mut self, counts: &ViewCounts) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec!["View".to_string(), "Tasks".to_string()];
        let rows = View::EVERY
            .iter()
            .map(|view| vec![view.label().to_string(), counts.get(*view).to_string()])
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub fn print_analytics(&mut self, snapshot: &AnalyticsSnapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "Total tasks         {}", snapshot.total_tasks)?;
        writeln!(out, "Completed           {}", snapshot.completed_tasks)?;
        writeln!(out, "Completion rate     {}%", snapshot.completion_rate)?;
        writeln!(
            out,
            "Avg estimated time  {}",
            format_minutes(snapshot.avg_estimated_time)
        )?;
        let overdue = snapshot.overdue_tasks.to_string();
        let overdue = if snapshot.overdue_tasks > 0 {
            self.paint(&overdue, "31")
        } else {
            overdue
        };
        writeln!(out, "Overdue             {overdue}")?;
        writeln!(out)?;

        writeln!(out, "By status")?;
        writeln!(out, "  pending      {}", snapshot.status_stats.pending)?;
        writeln!(out, "  in progress  {}", snapshot.status_stats.in_progress)?;
        writeln!(out, "  completed    {}", snapshot.status_stats.completed)?;
        writeln!(out)?;

        writeln!(out, "By priority")?;
        writeln!(out, "  high    {}", snapshot.priority_stats.high)?;
        writeln!(out, "  medium  {}", snapshot.priority_stats.medium)?;
        writeln!(out, "  low     {}", snapshot.priority_stats.low)?;
        writeln!(out)?;

        writeln!(out, "Completed, last 7 days")?;
        for point in &snapshot.productivity_trend {
            let bar = "█".repeat(point.completed);
            writeln!(out, "  {}  {:<3} {}", point.date, point.completed, bar)?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, log, current_hour))]
    pub fn print_activity_grid(
        &mut self,
        log: &ActivityLog,
        current_hour: Option<u8>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "Activity log for {}", log.date)?;
        writeln!(out)?;

        let headers = vec![
            "Hour".to_string(),
            "Activity".to_string(),
            "Category".to_string(),
            "Mood".to_string(),
            "Productivity".to_string(),
        ];

        let mut rows = Vec::with_capacity(24);
        for hour in 0u8..24 {
            let mut label = format_hour(hour);
            if current_hour == Some(hour) {
                label.push_str(" ●");
            }

            let row = match log.activities.iter().find(|entry| entry.hour == hour) {
                Some(entry) => {
                    let stars = format!(
                        "{}{}",
                        "★".repeat(usize::from(entry.productivity)),
                        "☆".repeat(5usize.saturating_sub(usize::from(entry.productivity)))
                    );
                    vec![
                        label,
                        entry.activity.clone(),
                        entry.category.label().to_string(),
                        entry.mood.label().to_string(),
                        stars,
                    ]
                }
                None => vec![
                    label,
                    "-".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ],
            };
            rows.push(row);
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

fn short_id(task: &Task) -> String {
    task.id.to_string().chars().take(8).collect()
}

/// "45m", "2h", "1h 30m"; zero renders as "0m".
pub fn format_minutes(minutes: u32) -> String {
    if minutes == 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        if mins > 0 {
            format!("{hours}h {mins}m")
        } else {
            format!("{hours}h")
        }
    } else {
        format!("{mins}m")
    }
}

/// 12-hour slot label: 0 -> "12:00 AM", 15 -> "3:00 PM".
pub fn format_hour(hour: u8) -> String {
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour {
        0 => 12,
        1..=12 => hour,
        _ => hour - 12,
    };
    format!("{display}:00 {period}")
}

/// Human label for a due date, relative to `now`'s calendar day in the
/// project timezone so it always agrees with the today view.
pub fn relative_due_label(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let due_date = to_project_date(due);
    let today = to_project_date(now);
    let days = due_date.signed_duration_since(today).num_days();

    match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        2..=7 => format!("In {days} days"),
        -7..=-2 => format!("{} days ago", -days),
        _ => {
            if due_date.year() == today.year() {
                due_date.format("%b %-d").to_string()
            } else {
                due_date.format("%b %-d, %Y").to_string()
            }
        }
    }
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

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{format_hour, format_minutes, relative_due_label};

    #[test]
    fn minutes_format_like_the_app() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(90), "1h 30m");
    }

    #[test]
    fn hour_labels_are_twelve_hour() {
        assert_eq!(format_hour(0), "12:00 AM");
        assert_eq!(format_hour(9), "9:00 AM");
        assert_eq!(format_hour(12), "12:00 PM");
        assert_eq!(format_hour(15), "3:00 PM");
        assert_eq!(format_hour(23), "11:00 PM");
    }

    #[test]
    fn due_labels_are_relative_to_calendar_days() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

        assert_eq!(relative_due_label(now + Duration::hours(5), now), "Today");
        assert_eq!(relative_due_label(now + Duration::days(1), now), "Tomorrow");
        assert_eq!(relative_due_label(now - Duration::days(1), now), "Yesterday");
        assert_eq!(relative_due_label(now + Duration::days(3), now), "In 3 days");
        assert_eq!(relative_due_label(now - Duration::days(5), now), "5 days ago");
        assert_eq!(relative_due_label(now + Duration::days(30), now), "Apr 1");

        let far = Utc.with_ymd_and_hms(2027, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(relative_due_label(far, now), "Jan 15, 2027");
    }
}
