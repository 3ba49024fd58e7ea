pub mod date;
pub mod message;
pub mod project;
pub mod resource;
pub mod task;
pub mod user;

pub use message::{Message, MessageView};
pub use project::{Project, ProjectPriority, ProjectStatus, ProjectView};
pub use resource::{Resource, ResourceType};
pub use task::{Task, TaskPayload, TaskPriority, TaskStatus};
pub use user::{Role, User, UserProfile, UserSummary};

/// Fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
