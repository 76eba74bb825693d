use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in progress",
            Status::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Ordering rank for sorts: low < medium < high.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

/// A task as handed over by the external repository. The engine never
/// mutates tasks; it only derives views and aggregates from them.
///
/// Field names on the wire are the backend's camelCase names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub status: Status,

    pub priority: Priority,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    /// Estimated effort in minutes; absent on the wire means 0.
    #[serde(default)]
    pub estimated_time: u32,

    /// Recorded effort in minutes; absent on the wire means 0.
    #[serde(default)]
    pub actual_time: u32,

    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, status: Status, priority: Priority, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status,
            priority,
            due_date: None,
            estimated_time: 0,
            actual_time: 0,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    /// The one overdue predicate: a task with a due date in the past
    /// that is not completed. Analytics and rendering both call this
    /// so the overdue count always matches what gets painted red.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != Status::Completed && self.due_date.map(|due| due < now).unwrap_or(false)
    }
}
