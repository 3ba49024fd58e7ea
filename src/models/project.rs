use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date;
use super::resource::Resource;
use super::task::{has_duplicates, Task, TaskPayload};
use super::user::UserSummary;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// The project aggregate. Tasks and resources live inside the document and
/// are persisted by rewriting the whole project.
///
/// `version` increases by one on every successful save; the store refuses a
/// save whose version no longer matches what is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: ProjectPriority,
    #[serde(with = "date")]
    pub start_date: DateTime<Utc>,
    #[serde(default, with = "date::option")]
    pub end_date: Option<DateTime<Utc>>,
    pub owner: String,
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with `owner` and `team` replaced by user summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    #[serde(with = "date")]
    pub start_date: DateTime<Utc>,
    #[serde(default, with = "date::option")]
    pub end_date: Option<DateTime<Utc>>,
    pub owner: Option<UserSummary>,
    pub team: Vec<UserSummary>,
    pub tasks: Vec<Task>,
    pub resources: Vec<Resource>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    #[serde(default, with = "date::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "date::option")]
    pub end_date: Option<DateTime<Utc>>,
    pub team: Option<Vec<String>>,
}

/// Patch for `PUT /projects/{id}`. There is no `owner` field:
/// unknown keys are dropped by the deserializer, so ownership cannot move.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    #[serde(default, with = "date::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "date::option")]
    pub end_date: Option<DateTime<Utc>>,
    pub team: Option<Vec<String>>,
}

fn required_name(name: Option<String>) -> AppResult<String> {
    match name.map(|n| n.trim().to_string()) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(AppError::bad_request("Project name is required")),
    }
}

fn check_team(team: &[String]) -> AppResult<()> {
    if has_duplicates(team) {
        return Err(AppError::bad_request("Team members must be unique"));
    }
    Ok(())
}

impl Project {
    pub fn create(id: String, owner: &str, req: CreateProjectRequest) -> AppResult<Self> {
        let name = required_name(req.name)?;
        let start_date = req
            .start_date
            .ok_or_else(|| AppError::bad_request("Project start date is required"))?;
        let team = req.team.unwrap_or_default();
        check_team(&team)?;

        let now = Utc::now();
        Ok(Project {
            id,
            name,
            description: req.description.unwrap_or_default(),
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            start_date,
            end_date: req.end_date,
            owner: owner.to_string(),
            team,
            tasks: Vec::new(),
            resources: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: UpdateProjectRequest) -> AppResult<()> {
        let name = match patch.name {
            Some(name) => Some(required_name(Some(name))?),
            None => None,
        };
        if let Some(team) = &patch.team {
            check_team(team)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if patch.end_date.is_some() {
            self.end_date = patch.end_date;
        }
        if let Some(team) = patch.team {
            self.team = team;
        }
        Ok(())
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner == user_id
    }

    pub fn is_team_member(&self, user_id: &str) -> bool {
        self.team.iter().any(|member| member == user_id)
    }

    /// Owner or team member.
    pub fn has_access(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.is_team_member(user_id)
    }

    /// Appends a member; refuses duplicates.
    pub fn add_member(&mut self, user_id: &str) -> AppResult<()> {
        if self.is_team_member(user_id) {
            return Err(AppError::bad_request("User is already in team"));
        }
        self.team.push(user_id.to_string());
        Ok(())
    }

    /// Removes a member if present. Returns whether anything changed.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        let before = self.team.len();
        self.team.retain(|member| member != user_id);
        self.team.len() != before
    }

    fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == task_id)
    }

    /// Creates a task when the payload has no id, otherwise patches the
    /// task with that id in place.
    pub fn upsert_task(&mut self, mut payload: TaskPayload) -> AppResult<()> {
        match payload.id.take() {
            Some(task_id) => {
                let idx = self
                    .task_index(&task_id)
                    .ok_or_else(|| AppError::not_found("Task not found in project"))?;
                self.tasks[idx].merge(payload)
            }
            None => {
                let task = Task::create(super::new_id(), payload)?;
                self.tasks.push(task);
                Ok(())
            }
        }
    }

    pub fn remove_task(&mut self, task_id: &str) -> AppResult<()> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != task_id);
        if self.tasks.len() == before {
            return Err(AppError::not_found("Task not found"));
        }
        Ok(())
    }

    pub fn resource(&self, resource_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|res| res.id == resource_id)
    }

    pub fn remove_resource(&mut self, resource_id: &str) -> AppResult<()> {
        let before = self.resources.len();
        self.resources.retain(|res| res.id != resource_id);
        if self.resources.len() == before {
            return Err(AppError::not_found("Resource not found"));
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Every user id this project references, owner first.
    pub fn referenced_users(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.team.len() + 1);
        ids.push(self.owner.clone());
        ids.extend(self.team.iter().cloned());
        ids
    }

    /// Resolves owner and team against `users`. Team members that no longer
    /// exist are skipped.
    pub fn into_view(self, users: &[UserSummary]) -> ProjectView {
        let lookup = |id: &str| users.iter().find(|u| u.id == id).cloned();
        let owner = lookup(&self.owner);
        let team = self.team.iter().filter_map(|id| lookup(id)).collect();

        ProjectView {
            id: self.id,
            name: self.name,
            description: self.description,
            status: self.status,
            priority: self.priority,
            start_date: self.start_date,
            end_date: self.end_date,
            owner,
            team,
            tasks: self.tasks,
            resources: self.resources,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
