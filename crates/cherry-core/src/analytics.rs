use chrono::{
  DateTime,
  Utc
};
use serde::Serialize;
use tracing::debug;

use crate::datetime::{
  day_key,
  format_day_key,
  trend_days
};
use crate::task::{
  Priority,
  Status,
  Task
};

/// Status distribution. A plain struct
/// so all three buckets are always
/// present in the output, zero or not.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct StatusStats {
  pub pending:     usize,
  #[serde(rename = "in-progress")]
  pub in_progress: usize,
  pub completed:   usize
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct PriorityStats {
  pub low:    usize,
  pub medium: usize,
  pub high:   usize
}

/// One day's slot in the 7-day
/// completion trend.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct TrendPoint {
  pub date:      String,
  pub completed: usize
}

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
  pub status_stats:       StatusStats,
  pub priority_stats:     PriorityStats,
  pub total_tasks:        usize,
  pub completed_tasks:    usize,
  /// Whole percent, rounded half-up;
  /// 0 for an empty snapshot.
  pub completion_rate:    u32,
  /// Minutes, rounded half-up; 0 for
  /// an empty snapshot.
  pub avg_estimated_time: u32,
  pub overdue_tasks:      usize,
  /// Exactly 7 buckets, oldest first,
  /// ending on `now`'s day.
  pub productivity_trend:
    Vec<TrendPoint>
}

/// Derives the full analytics snapshot
/// from the task collection. Pure:
/// fixed `tasks` and `now` always
/// produce the same output, and empty
/// input is a defined zero snapshot,
/// not an error.
#[tracing::instrument(skip(
  tasks, now
))]
pub fn compute_analytics(
  tasks: &[Task],
  now: DateTime<Utc>
) -> AnalyticsSnapshot {
  let mut status_stats =
    StatusStats::default();
  let mut priority_stats =
    PriorityStats::default();
  let mut estimated_sum: u64 = 0;
  let mut overdue_tasks = 0;

  let trend_keys: Vec<String> =
    trend_days(now)
      .into_iter()
      .map(format_day_key)
      .collect();
  let mut trend_counts = [0usize; 7];

  for task in tasks {
    match task.status {
      | Status::Pending => {
        status_stats.pending += 1;
      }
      | Status::InProgress => {
        status_stats.in_progress += 1;
      }
      | Status::Completed => {
        status_stats.completed += 1;

        // A task is attributed to the
        // day of its current
        // updatedAt only; the snapshot
        // carries no history.
        let completed_key =
          day_key(task.updated_at);
        if let Some(slot) = trend_keys
          .iter()
          .position(|key| {
            *key == completed_key
          })
        {
          trend_counts[slot] += 1;
        }
      }
    }

    match task.priority {
      | Priority::Low => {
        priority_stats.low += 1;
      }
      | Priority::Medium => {
        priority_stats.medium += 1;
      }
      | Priority::High => {
        priority_stats.high += 1;
      }
    }

    estimated_sum +=
      u64::from(task.estimated_time);
    if task.is_overdue(now) {
      overdue_tasks += 1;
    }
  }

  let total_tasks = tasks.len();
  let completed_tasks =
    status_stats.completed;

  let completion_rate =
    if total_tasks > 0 {
      (completed_tasks as f64
        / total_tasks as f64
        * 100.0)
        .round() as u32
    } else {
      0
    };
  let avg_estimated_time =
    if total_tasks > 0 {
      (estimated_sum as f64
        / total_tasks as f64)
        .round() as u32
    } else {
      0
    };

  let productivity_trend = trend_keys
    .into_iter()
    .zip(trend_counts)
    .map(|(date, completed)| {
      TrendPoint {
        date,
        completed
      }
    })
    .collect();

  debug!(
    total_tasks,
    completed_tasks,
    completion_rate,
    overdue_tasks,
    "computed analytics snapshot"
  );

  AnalyticsSnapshot {
    status_stats,
    priority_stats,
    total_tasks,
    completed_tasks,
    completion_rate,
    avg_estimated_time,
    overdue_tasks,
    productivity_trend
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    Duration,
    TimeZone,
    Utc
  };

  use super::compute_analytics;
  use crate::task::{
    Priority,
    Status,
    Task
  };

  fn noon() -> DateTime<Utc> {
    Utc
      .with_ymd_and_hms(
        2026, 3, 2, 12, 0, 0
      )
      .unwrap()
  }

  #[test]
  fn empty_snapshot_is_all_zeroes() {
    let snapshot =
      compute_analytics(&[], noon());

    assert_eq!(snapshot.total_tasks, 0);
    assert_eq!(
      snapshot.completed_tasks,
      0
    );
    assert_eq!(
      snapshot.completion_rate,
      0
    );
    assert_eq!(
      snapshot.avg_estimated_time,
      0
    );
    assert_eq!(
      snapshot.overdue_tasks,
      0
    );
    assert_eq!(
      snapshot.status_stats.pending,
      0
    );
    assert_eq!(
      snapshot.priority_stats.high,
      0
    );
    assert_eq!(
      snapshot.productivity_trend.len(),
      7
    );
    assert!(
      snapshot
        .productivity_trend
        .iter()
        .all(|point| {
          point.completed == 0
        })
    );
  }

  #[test]
  fn all_completed_means_full_rate() {
    let now = noon();
    let tasks = vec![
      Task::new(
        "a",
        Status::Completed,
        Priority::Low,
        now
      ),
      Task::new(
        "b",
        Status::Completed,
        Priority::High,
        now
      ),
    ];

    let snapshot =
      compute_analytics(&tasks, now);
    assert_eq!(
      snapshot.completion_rate,
      100
    );
    assert_eq!(
      snapshot.completed_tasks,
      2
    );
  }

  #[test]
  fn completion_rate_rounds_half_up() {
    let now = noon();
    let mut tasks = vec![Task::new(
      "done",
      Status::Completed,
      Priority::Low,
      now
    )];
    for idx in 0..7 {
      tasks.push(Task::new(
        format!("open {idx}"),
        Status::Pending,
        Priority::Low,
        now
      ));
    }

    // 1 of 8 = 12.5%, rounds to 13.
    let snapshot =
      compute_analytics(&tasks, now);
    assert_eq!(
      snapshot.completion_rate,
      13
    );
  }

  #[test]
  fn average_treats_missing_estimate_as_zero()
   {
    let now = noon();
    let mut estimated = Task::new(
      "estimated",
      Status::Pending,
      Priority::Medium,
      now
    );
    estimated.estimated_time = 90;
    let unestimated = Task::new(
      "unestimated",
      Status::Pending,
      Priority::Medium,
      now
    );

    let snapshot = compute_analytics(
      &[estimated, unestimated],
      now
    );
    assert_eq!(
      snapshot.avg_estimated_time,
      45
    );
  }

  #[test]
  fn overdue_ignores_completed_tasks()
  {
    let now = noon();
    let mut done_late = Task::new(
      "done late",
      Status::Completed,
      Priority::Medium,
      now
    );
    done_late.due_date =
      Some(now - Duration::days(1));
    let mut still_open = Task::new(
      "still open",
      Status::Pending,
      Priority::Medium,
      now
    );
    still_open.due_date =
      Some(now - Duration::hours(2));

    let snapshot = compute_analytics(
      &[done_late, still_open],
      now
    );
    assert_eq!(
      snapshot.overdue_tasks,
      1
    );
  }

  #[test]
  fn trend_buckets_by_updated_day() {
    let now = noon();
    let today = Task::new(
      "completed today",
      Status::Completed,
      Priority::Low,
      now
    );
    let mut earlier = Task::new(
      "completed earlier",
      Status::Completed,
      Priority::Low,
      now
    );
    earlier.updated_at =
      now - Duration::days(3);
    let mut ancient = Task::new(
      "completed long ago",
      Status::Completed,
      Priority::Low,
      now
    );
    ancient.updated_at =
      now - Duration::days(10);

    let snapshot = compute_analytics(
      &[today, earlier, ancient],
      now
    );
    let trend =
      &snapshot.productivity_trend;

    assert_eq!(trend.len(), 7);
    assert_eq!(
      trend[6].date,
      "2026-03-02"
    );
    assert_eq!(trend[6].completed, 1);
    assert_eq!(
      trend[3].date,
      "2026-02-27"
    );
    assert_eq!(trend[3].completed, 1);

    let elsewhere: usize = trend
      .iter()
      .enumerate()
      .filter(|(idx, _)| {
        *idx != 3 && *idx != 6
      })
      .map(|(_, point)| {
        point.completed
      })
      .sum();
    assert_eq!(elsewhere, 0);
  }

  #[test]
  fn snapshot_keys_are_wire_names() {
    let snapshot =
      compute_analytics(&[], noon());
    let json =
      serde_json::to_value(&snapshot)
        .expect("serialize snapshot");

    assert!(
      json["statusStats"]
        .get("in-progress")
        .is_some()
    );
    assert!(
      json["priorityStats"]
        .get("medium")
        .is_some()
    );
    assert!(
      json.get("completionRate")
        .is_some()
    );
    assert!(
      json.get("avgEstimatedTime")
        .is_some()
    );
    assert!(
      json.get("productivityTrend")
        .is_some()
    );
  }
}
