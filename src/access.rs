//! Who may do what to a project.
//!
//! | operation                  | allowed                       |
//! |----------------------------|-------------------------------|
//! | create project             | any authenticated caller      |
//! | read / list, add resource  | owner or team member          |
//! | update / delete project    | owner                         |
//! | team and task mutation     | any authenticated caller      |
//! | delete resource            | owner or the resource creator |
//! | read messages, mark read   | owner or team member          |

use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::models::{Project, Resource};

pub fn ensure_access(project: &Project, caller: &Identity, action: &str) -> AppResult<()> {
    if project.has_access(&caller.id) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("Not authorized to {}", action)))
    }
}

pub fn ensure_owner(project: &Project, caller: &Identity, action: &str) -> AppResult<()> {
    if project.is_owner(&caller.id) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("Not authorized to {}", action)))
    }
}

/// Team membership alone is not enough to remove someone else's resource.
pub fn ensure_can_remove_resource(
    project: &Project,
    resource: &Resource,
    caller: &Identity,
) -> AppResult<()> {
    if project.is_owner(&caller.id) || resource.created_by == caller.id {
        Ok(())
    } else {
        Err(AppError::forbidden("Not authorized to delete this resource"))
    }
}
