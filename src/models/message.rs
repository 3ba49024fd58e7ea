use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;

/// A chat message scoped to one project. Stored in its own collection,
/// keyed back to the project by `project`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub project: String,
    pub sender: String,
    pub content: String,
    #[serde(default)]
    pub read_by: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub id: String,
    pub project: String,
    pub sender: Option<UserSummary>,
    pub content: String,
    pub read_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn into_view(self, sender: Option<UserSummary>) -> MessageView {
        MessageView {
            id: self.id,
            project: self.project,
            sender,
            content: self.content,
            read_by: self.read_by,
            created_at: self.created_at,
        }
    }
}
