use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_ACTIVITY_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 500;

/// Rejections from the activity grid. The first four are validation
/// errors on mutation input; the hour and lookup variants are caller
/// errors surfaced before any derived state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivityError {
    #[error("activity description must not be empty")]
    EmptyActivity,

    #[error("activity description exceeds {MAX_ACTIVITY_LEN} characters (got {0})")]
    ActivityTooLong(usize),

    #[error("notes exceed {MAX_NOTES_LEN} characters (got {0})")]
    NotesTooLong(usize),

    #[error("productivity must be between 1 and 5 (got {0})")]
    ProductivityOutOfRange(u8),

    #[error("hour must be between 0 and 23 (got {0})")]
    HourOutOfRange(u8),

    #[error("no activity recorded for hour {0}")]
    NoEntryForHour(u8),
}

/// An hour-of-day slot, validated to [0, 23] at construction so
/// lookups never have to answer for out-of-range input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hour(u8);

impl Hour {
    pub fn new(hour: u8) -> Result<Self, ActivityError> {
        if hour > 23 {
            return Err(ActivityError::HourOutOfRange(hour));
        }
        Ok(Self(hour))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Health,
    Education,
    Entertainment,
    Social,
    #[default]
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Entertainment => "Entertainment",
            Category::Social => "Social",
            Category::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    #[default]
    Neutral,
    Poor,
    Terrible,
}

impl Mood {
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Poor => "poor",
            Mood::Terrible => "terrible",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEntry {
    pub hour: u8,
    pub activity: String,
    pub category: Category,
    pub mood: Mood,
    pub productivity: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

/// What the user submits for one hour slot; the hour itself comes from
/// the slot being edited, not the form.
#[derive(Debug, Clone)]
pub struct ActivityDraft {
    pub activity: String,
    pub category: Category,
    pub mood: Mood,
    pub productivity: u8,
    pub notes: Option<String>,
}

impl ActivityDraft {
    fn validate(&self) -> Result<(), ActivityError> {
        if self.activity.trim().is_empty() {
            return Err(ActivityError::EmptyActivity);
        }
        let activity_len = self.activity.chars().count();
        if activity_len > MAX_ACTIVITY_LEN {
            return Err(ActivityError::ActivityTooLong(activity_len));
        }
        if let Some(notes) = &self.notes {
            let notes_len = notes.chars().count();
            if notes_len > MAX_NOTES_LEN {
                return Err(ActivityError::NotesTooLong(notes_len));
            }
        }
        if !(1..=5).contains(&self.productivity) {
            return Err(ActivityError::ProductivityOutOfRange(self.productivity));
        }
        Ok(())
    }
}

/// One calendar day's activity log: a partial mapping hour -> entry,
/// at most one entry per hour, keyed by a `YYYY-MM-DD` day key. The
/// external repository fetches and replaces it as a whole unit;
/// mutations here return a new log and leave the input untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityLog {
    pub date: String,
    #[serde(default)]
    pub activities: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            activities: vec![],
        }
    }

    pub fn entry_for_hour(&self, hour: Hour) -> Option<&ActivityEntry> {
        self.activities
            .iter()
            .find(|entry| entry.hour == hour.get())
    }

    /// Replaces any existing entry at `hour` with the validated draft.
    /// Validation failures are reported before anything changes.
    pub fn upsert(&self, hour: Hour, draft: ActivityDraft) -> Result<Self, ActivityError> {
        draft.validate()?;

        let mut next = self.clone();
        next.activities
            .retain(|entry| entry.hour != hour.get());
        next.activities.push(ActivityEntry {
            hour: hour.get(),
            activity: draft.activity,
            category: draft.category,
            mood: draft.mood,
            productivity: draft.productivity,
            notes: draft.notes,
        });
        next.activities.sort_by_key(|entry| entry.hour);
        Ok(next)
    }

    /// Removes the entry at `hour`; removing an absent hour is the
    /// caller's error, reported as [`ActivityError::NoEntryForHour`].
    pub fn remove(&self, hour: Hour) -> Result<Self, ActivityError> {
        if self.entry_for_hour(hour).is_none() {
            return Err(ActivityError::NoEntryForHour(hour.get()));
        }

        let mut next = self.clone();
        next.activities
            .retain(|entry| entry.hour != hour.get());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityDraft, ActivityError, ActivityLog, Category, Hour, Mood};

    fn draft(activity: &str) -> ActivityDraft {
        ActivityDraft {
            activity: activity.to_string(),
            category: Category::Work,
            mood: Mood::Good,
            productivity: 4,
            notes: None,
        }
    }

    #[test]
    fn hour_is_validated_at_construction() {
        assert!(Hour::new(0).is_ok());
        assert!(Hour::new(23).is_ok());
        assert_eq!(Hour::new(24), Err(ActivityError::HourOutOfRange(24)));
    }

    #[test]
    fn upsert_then_lookup_round_trips() {
        let log = ActivityLog::empty("2026-03-02");
        let hour = Hour::new(9).expect("valid hour");

        let log = log.upsert(hour, draft("standup")).expect("upsert");
        let entry = log.entry_for_hour(hour).expect("entry present");
        assert_eq!(entry.activity, "standup");
        assert_eq!(entry.hour, 9);
        assert_eq!(entry.productivity, 4);

        let log = log.remove(hour).expect("remove");
        assert!(log.entry_for_hour(hour).is_none());
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let log = ActivityLog::empty("2026-03-02");
        let hour = Hour::new(14).expect("valid hour");

        let log = log.upsert(hour, draft("emails")).expect("first upsert");
        let log = log.upsert(hour, draft("code review")).expect("second upsert");

        assert_eq!(log.activities.len(), 1);
        assert_eq!(
            log.entry_for_hour(hour).expect("entry").activity,
            "code review"
        );
    }

    #[test]
    fn entries_stay_ordered_by_hour() {
        let log = ActivityLog::empty("2026-03-02");
        let log = log
            .upsert(Hour::new(17).expect("hour"), draft("gym"))
            .expect("upsert 17");
        let log = log
            .upsert(Hour::new(8).expect("hour"), draft("breakfast"))
            .expect("upsert 8");

        let hours: Vec<u8> = log.activities.iter().map(|entry| entry.hour).collect();
        assert_eq!(hours, vec![8, 17]);
    }

    #[test]
    fn blank_activity_is_rejected_and_log_unchanged() {
        let log = ActivityLog::empty("2026-03-02");
        let hour = Hour::new(5).expect("valid hour");

        let err = log.upsert(hour, draft("   ")).expect_err("must reject");
        assert_eq!(err, ActivityError::EmptyActivity);
        assert!(log.activities.is_empty());
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let log = ActivityLog::empty("2026-03-02");
        let hour = Hour::new(5).expect("valid hour");

        let err = log
            .upsert(hour, draft(&"x".repeat(201)))
            .expect_err("overlong activity");
        assert_eq!(err, ActivityError::ActivityTooLong(201));

        let mut noisy = draft("ok");
        noisy.notes = Some("n".repeat(501));
        let err = log.upsert(hour, noisy).expect_err("overlong notes");
        assert_eq!(err, ActivityError::NotesTooLong(501));
    }

    #[test]
    fn productivity_must_be_one_through_five() {
        let log = ActivityLog::empty("2026-03-02");
        let hour = Hour::new(5).expect("valid hour");

        for bad in [0u8, 6] {
            let mut d = draft("ok");
            d.productivity = bad;
            let err = log.upsert(hour, d).expect_err("out of range");
            assert_eq!(err, ActivityError::ProductivityOutOfRange(bad));
        }
    }

    #[test]
    fn removing_absent_hour_is_an_error() {
        let log = ActivityLog::empty("2026-03-02");
        let hour = Hour::new(12).expect("valid hour");

        assert_eq!(
            log.remove(hour),
            Err(ActivityError::NoEntryForHour(12))
        );
    }

    #[test]
    fn wire_shape_matches_backend() {
        let log = ActivityLog::empty("2026-03-02");
        let log = log
            .upsert(Hour::new(10).expect("hour"), draft("deep work"))
            .expect("upsert");

        let json = serde_json::to_value(&log).expect("serialize log");
        assert_eq!(json["date"], "2026-03-02");
        assert_eq!(json["activities"][0]["hour"], 10);
        assert_eq!(json["activities"][0]["category"], "work");
        assert_eq!(json["activities"][0]["mood"], "good");
    }
}
