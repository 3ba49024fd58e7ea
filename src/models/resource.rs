use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Drive,
    Folder,
    Document,
    Link,
    Other,
}

/// A link attached to a project. `created_by` is fixed at creation and
/// decides, together with the project owner, who may remove it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewResource {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ResourceType>,
    pub url: Option<String>,
    pub description: Option<String>,
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://\S+$").expect("static URL pattern"))
}

pub fn is_valid_url(url: &str) -> bool {
    url_pattern().is_match(url)
}

impl Resource {
    pub fn create(id: String, created_by: &str, input: NewResource) -> AppResult<Self> {
        let name = input.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let url = input.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());

        let (name, kind, url) = match (name, input.kind, url) {
            (Some(name), Some(kind), Some(url)) => (name, kind, url),
            _ => return Err(AppError::bad_request("Name, type and URL are required")),
        };
        if !is_valid_url(&url) {
            return Err(AppError::bad_request("Invalid URL: please provide a valid URL"));
        }

        Ok(Resource {
            id,
            name,
            kind,
            url,
            description: input.description.unwrap_or_default(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        })
    }
}
