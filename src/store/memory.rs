use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{MessageStore, ProjectStore, StoreError, StoreResult, UserStore};
use crate::models::{Message, Project, User};

/// In-process stand-in for MongoDB with the same version check on project
/// saves and the same unique email constraint.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    projects: RwLock<HashMap<String, Project>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("User".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn search_email(&self, query: &str) -> StoreResult<Vec<User>> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.email.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(StoreError::Duplicate("User".to_string()));
        }
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert(&self, project: &Project) -> StoreResult<()> {
        self.projects.write().await.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn find_for_user(&self, user_id: &str) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .values()
            .filter(|p| p.has_access(user_id))
            .cloned()
            .collect())
    }

    async fn save(&self, project: &mut Project) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project.id) {
            Some(stored) if stored.version == project.version => {
                project.version += 1;
                *stored = project.clone();
                Ok(())
            }
            _ => Err(StoreError::Conflict),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.projects.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: &Message) -> StoreResult<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Message>> {
        Ok(self.messages.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_project(&self, project_id: &str) -> StoreResult<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.project == project_id)
            .cloned()
            .collect())
    }

    async fn add_reader(&self, id: &str, user_id: &str) -> StoreResult<Option<Message>> {
        let mut messages = self.messages.write().await;
        let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if !message.read_by.iter().any(|r| r == user_id) {
            message.read_by.push(user_id.to_string());
            message.updated_at = Utc::now();
        }
        Ok(Some(message.clone()))
    }

    async fn delete_by_project(&self, project_id: &str) -> StoreResult<u64> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.project != project_id);
        Ok((before - messages.len()) as u64)
    }
}
