use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date;
use crate::error::{AppError, AppResult};

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

fn default_weight() -> u8 {
    MIN_WEIGHT
}

/// A task embedded in its project's `tasks` array. Its id is only unique
/// within that array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default = "default_weight")]
    pub weight: u8,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default, with = "date::option")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Body of `PUT /projects/{id}/tasks`. With an `id` it patches that task,
/// without one it creates a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub weight: Option<u8>,
    pub assigned_to: Option<Vec<String>>,
    #[serde(default, with = "date::option")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskPayload {
    /// Checks the fields that are present. Absent fields are never an error
    /// here; `Task::create` enforces the title on its own.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::bad_request("Task title is required"));
            }
        }
        if let Some(weight) = self.weight {
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
                return Err(AppError::bad_request(format!(
                    "Task weight must be between {} and {}",
                    MIN_WEIGHT, MAX_WEIGHT
                )));
            }
        }
        if let Some(assignees) = &self.assigned_to {
            if has_duplicates(assignees) {
                return Err(AppError::bad_request("Task assignees must be unique"));
            }
        }
        Ok(())
    }
}

impl Task {
    pub fn create(id: String, payload: TaskPayload) -> AppResult<Self> {
        let title = match payload.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => return Err(AppError::bad_request("Task title is required")),
        };
        payload.validate()?;

        Ok(Task {
            id,
            title,
            description: payload.description,
            status: payload.status.unwrap_or_default(),
            priority: payload.priority.unwrap_or_default(),
            weight: payload.weight.unwrap_or(MIN_WEIGHT),
            assigned_to: payload.assigned_to.unwrap_or_default(),
            due_date: payload.due_date,
        })
    }

    /// Partial update: only fields present in the payload are touched.
    pub fn merge(&mut self, payload: TaskPayload) -> AppResult<()> {
        payload.validate()?;

        if let Some(title) = payload.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = payload.description {
            self.description = Some(description);
        }
        if let Some(status) = payload.status {
            self.status = status;
        }
        if let Some(priority) = payload.priority {
            self.priority = priority;
        }
        if let Some(weight) = payload.weight {
            self.weight = weight;
        }
        if let Some(assignees) = payload.assigned_to {
            self.assigned_to = assignees;
        }
        if payload.due_date.is_some() {
            self.due_date = payload.due_date;
        }
        Ok(())
    }
}

pub(crate) fn has_duplicates(ids: &[String]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    !ids.iter().all(|id| seen.insert(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str) -> TaskPayload {
        TaskPayload {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults() {
        let task = Task::create("t1".into(), payload("Write docs")).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.weight, 1);
        assert!(task.assigned_to.is_empty());
    }

    #[test]
    fn create_requires_a_title() {
        let err = Task::create("t1".into(), payload("   ")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Task title is required"));

        let err = Task::create("t1".into(), TaskPayload::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn merge_keeps_fields_missing_from_payload() {
        let mut task = Task::create("t1".into(), payload("Keep me")).unwrap();
        task.description = Some("details".into());

        task.merge(TaskPayload {
            status: Some(TaskStatus::Done),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(task.title, "Keep me");
        assert_eq!(task.description.as_deref(), Some("details"));
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn weight_outside_range_is_rejected() {
        let mut bad = payload("Heavy");
        bad.weight = Some(11);
        assert!(Task::create("t1".into(), bad).is_err());

        let mut zero = payload("Light");
        zero.weight = Some(0);
        assert!(Task::create("t1".into(), zero).is_err());
    }

    #[test]
    fn duplicate_assignees_are_rejected() {
        let mut dup = payload("Pair");
        dup.assigned_to = Some(vec!["u1".into(), "u1".into()]);
        assert!(dup.validate().is_err());
    }

    #[test]
    fn statuses_use_kebab_case_on_the_wire() {
        let status: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
    }
}
