use std::cmp::Ordering;

use chrono::{
  DateTime,
  Utc
};
use clap::ValueEnum;
use serde::Serialize;
use tracing::trace;

use crate::datetime::{
  next_seven_days_window,
  today_window
};
use crate::task::{
  Priority,
  Status,
  Task
};

/// A named subset of the task
/// snapshot. The sidebar badge counts
/// and the list a view navigates to
/// are both derived from
/// [`View::matches`], so they can
/// never disagree.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  ValueEnum,
)]
pub enum View {
  Today,
  Upcoming,
  Completed,
  All
}

impl View {
  pub const EVERY: [View; 4] = [
    View::Today,
    View::Upcoming,
    View::Completed,
    View::All
  ];

  pub fn label(&self) -> &'static str {
    match self {
      | View::Today => "Today",
      | View::Upcoming => "Upcoming",
      | View::Completed => "Completed",
      | View::All => "All Tasks"
    }
  }

  pub fn description(
    &self
  ) -> &'static str {
    match self {
      | View::Today => {
        "Tasks due today"
      }
      | View::Upcoming => {
        "Tasks due in the next 7 days"
      }
      | View::Completed => {
        "Your completed tasks"
      }
      | View::All => {
        "All your tasks in one place"
      }
    }
  }

  /// The view predicate. A task with
  /// no due date never matches today
  /// or upcoming; status is not part
  /// of the date views, so a completed
  /// task due today still shows under
  /// Today.
  pub fn matches(
    &self,
    task: &Task,
    now: DateTime<Utc>
  ) -> bool {
    let ok = match self {
      | View::Today => {
        task
          .due_date
          .map(|due| {
            let (start, end) =
              today_window(now);
            due >= start && due < end
          })
          .unwrap_or(false)
      }
      | View::Upcoming => {
        task
          .due_date
          .map(|due| {
            let (start, end) =
              next_seven_days_window(
                now
              );
            due > start && due <= end
          })
          .unwrap_or(false)
      }
      | View::Completed => {
        task.status
          == Status::Completed
      }
      | View::All => true
    };

    trace!(view = ?self, id = %task.id, ok, "view predicate evaluation");
    ok
  }
}

/// Non-destructive view filter;
/// preserves the snapshot's relative
/// order.
#[tracing::instrument(skip(
  tasks, now
))]
pub fn filter_tasks<'a>(
  tasks: &'a [Task],
  view: View,
  now: DateTime<Utc>
) -> Vec<&'a Task> {
  tasks
    .iter()
    .filter(|task| {
      view.matches(task, now)
    })
    .collect()
}

/// Sidebar badge counts, one per view.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct ViewCounts {
  pub today:     usize,
  pub upcoming:  usize,
  pub completed: usize,
  pub all:       usize
}

impl ViewCounts {
  pub fn get(
    &self,
    view: View
  ) -> usize {
    match view {
      | View::Today => self.today,
      | View::Upcoming => self.upcoming,
      | View::Completed => {
        self.completed
      }
      | View::All => self.all
    }
  }
}

/// One pass over the snapshot, driven
/// by the same predicate as
/// [`filter_tasks`].
#[tracing::instrument(skip(
  tasks, now
))]
pub fn counts_by_view(
  tasks: &[Task],
  now: DateTime<Utc>
) -> ViewCounts {
  let mut counts = ViewCounts {
    today:     0,
    upcoming:  0,
    completed: 0,
    all:       0
  };

  for task in tasks {
    if View::Today.matches(task, now) {
      counts.today += 1;
    }
    if View::Upcoming
      .matches(task, now)
    {
      counts.upcoming += 1;
    }
    if View::Completed
      .matches(task, now)
    {
      counts.completed += 1;
    }
    counts.all += 1;
  }

  counts
}

/// Optional status/priority
/// refinement applied on top of a
/// view, matching the list screen's
/// filter panel.
#[derive(
  Debug, Clone, Copy, Default,
)]
pub struct ListFilter {
  pub status:   Option<Status>,
  pub priority: Option<Priority>
}

impl ListFilter {
  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    self
      .status
      .map(|status| {
        task.status == status
      })
      .unwrap_or(true)
      && self
        .priority
        .map(|priority| {
          task.priority == priority
        })
        .unwrap_or(true)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  ValueEnum,
)]
pub enum SortKey {
  CreatedAt,
  DueDate,
  Priority,
  Title
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  ValueEnum,
)]
pub enum SortOrder {
  Asc,
  Desc
}

/// Stable sort on one key; ties fall
/// back to creation time, then id, so
/// output is reproducible for a fixed
/// snapshot.
pub fn sort_tasks(
  tasks: &mut [&Task],
  key: SortKey,
  order: SortOrder
) {
  tasks.sort_by(|a, b| {
    let ordering =
      compare_on_key(a, b, key);
    let ordering = match order {
      | SortOrder::Asc => ordering,
      | SortOrder::Desc => {
        ordering.reverse()
      }
    };
    ordering
      .then_with(|| {
        a.created_at.cmp(&b.created_at)
      })
      .then_with(|| a.id.cmp(&b.id))
  });
}

fn compare_on_key(
  a: &Task,
  b: &Task,
  key: SortKey
) -> Ordering {
  match key {
    | SortKey::CreatedAt => {
      a.created_at.cmp(&b.created_at)
    }
    | SortKey::DueDate => {
      cmp_optional(
        a.due_date.as_ref(),
        b.due_date.as_ref()
      )
    }
    | SortKey::Priority => {
      a.priority
        .rank()
        .cmp(&b.priority.rank())
    }
    | SortKey::Title => {
      a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
    }
  }
}

// Tasks with a value sort before tasks
// without one.
fn cmp_optional<T: Ord>(
  left: Option<&T>,
  right: Option<&T>
) -> Ordering {
  match (left, right) {
    | (Some(a), Some(b)) => a.cmp(b),
    | (Some(_), None) => Ordering::Less,
    | (None, Some(_)) => {
      Ordering::Greater
    }
    | (None, None) => Ordering::Equal
  }
}
