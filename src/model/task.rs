use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum nesting depth for subtasks. Valid levels are `0..MAX_TASK_DEPTH`.
pub const MAX_TASK_DEPTH: u8 = 10;

/// Display status derived from completion state and dates. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Overdue,
    Completed,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Overdue => "Overdue",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// A single to-do item. Tasks nest via `parent_id`; `level` caches the
/// depth of the ancestor chain and is recomputed on every structural move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub assignee: String,
    pub completed: bool,
    /// Set when the task is marked complete, cleared when it is reopened.
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub level: u8,
    #[serde(default)]
    pub collapsed: bool,
}

impl Task {
    /// Create a new root-level task spanning one week from `start`.
    pub fn new(name: impl Into<String>, project_id: Uuid, start: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            parent_id: None,
            name: name.into(),
            notes: String::new(),
            assignee: String::new(),
            completed: false,
            completion_date: None,
            start_date: start,
            due_date: start + Duration::days(6),
            level: 0,
            collapsed: false,
        }
    }

    /// Create a child of `parent`, inheriting its project and dates.
    pub fn new_child(name: impl Into<String>, parent: &Task) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: parent.project_id,
            parent_id: Some(parent.id),
            name: name.into(),
            notes: String::new(),
            assignee: String::new(),
            completed: false,
            completion_date: None,
            start_date: parent.start_date,
            due_date: parent.due_date,
            level: parent.level + 1,
            collapsed: false,
        }
    }

    /// Set the completion flag, stamping or clearing the completion time.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.completion_date = if completed { Some(now) } else { None };
    }

    /// Derive the display status for `today`.
    pub fn status(&self, today: NaiveDate) -> TaskStatus {
        if self.completed {
            TaskStatus::Completed
        } else if self.due_date < today {
            TaskStatus::Overdue
        } else if self.start_date <= today {
            TaskStatus::InProgress
        } else {
            TaskStatus::NotStarted
        }
    }

    /// Inclusive span in days (a task due the day it starts lasts 1 day).
    pub fn duration_days(&self) -> i64 {
        (self.due_date - self.start_date).num_days() + 1
    }

    pub fn is_subtask(&self) -> bool {
        self.level > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_follows_dates_and_completion() {
        let today = date(2024, 6, 10);
        let mut task = Task::new("report", Uuid::new_v4(), date(2024, 6, 8));
        assert_eq!(task.status(today), TaskStatus::InProgress);

        task.start_date = date(2024, 6, 12);
        task.due_date = date(2024, 6, 15);
        assert_eq!(task.status(today), TaskStatus::NotStarted);

        task.start_date = date(2024, 6, 1);
        task.due_date = date(2024, 6, 9);
        assert_eq!(task.status(today), TaskStatus::Overdue);

        task.set_completed(true, Utc::now());
        assert_eq!(task.status(today), TaskStatus::Completed);
    }

    #[test]
    fn completion_stamp_set_and_cleared() {
        let mut task = Task::new("ship", Uuid::new_v4(), date(2024, 1, 1));
        assert!(task.completion_date.is_none());

        let now = Utc::now();
        task.set_completed(true, now);
        assert_eq!(task.completion_date, Some(now));

        task.set_completed(false, Utc::now());
        assert!(!task.completed);
        assert!(task.completion_date.is_none());
    }

    #[test]
    fn duration_is_inclusive() {
        let mut task = Task::new("spike", Uuid::new_v4(), date(2024, 3, 4));
        task.due_date = date(2024, 3, 4);
        assert_eq!(task.duration_days(), 1);
        task.due_date = date(2024, 3, 10);
        assert_eq!(task.duration_days(), 7);
    }
}
