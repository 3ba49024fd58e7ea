use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, info};
use chrono::Utc;
use mongodb::bson::{doc, to_bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use super::{MessageStore, ProjectStore, StoreError, StoreResult, UserStore};
use crate::models::{Message, Project, User};

const USERS: &str = "users";
const PROJECTS: &str = "projects";
const MESSAGES: &str = "messages";

const DUPLICATE_KEY: i32 = 11000;

/// All three stores over one MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>(USERS)
    }

    fn projects(&self) -> Collection<Project> {
        self.db.collection::<Project>(PROJECTS)
    }

    fn messages(&self) -> Collection<Message> {
        self.db.collection::<Message>(MESSAGES)
    }

    pub async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        let unique = IndexOptions::builder().unique(true).build();
        self.users()
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).options(unique).build())
            .await?;
        self.projects()
            .create_index(IndexModel::builder().keys(doc! { "owner": 1 }).build())
            .await?;
        self.projects()
            .create_index(IndexModel::builder().keys(doc! { "team": 1 }).build())
            .await?;
        self.messages()
            .create_index(IndexModel::builder().keys(doc! { "project": 1, "createdAt": 1 }).build())
            .await?;
        info!("MongoDB indexes ensured");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        match self.users().insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("User".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.users().find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_email(&self, query: &str) -> StoreResult<Vec<User>> {
        let filter = doc! { "email": { "$regex": regex::escape(query), "$options": "i" } };
        let cursor = self.users().find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let cursor = self.users().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update(&self, user: &User) -> StoreResult<bool> {
        match self.users().replace_one(doc! { "_id": user.id.as_str() }, user).await {
            Ok(res) => Ok(res.matched_count == 1),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("User".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let res = self.users().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }
}

#[async_trait]
impl ProjectStore for MongoStore {
    async fn insert(&self, project: &Project) -> StoreResult<()> {
        self.projects().insert_one(project).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.projects().find_one(doc! { "_id": id }).await?)
    }

    async fn find_for_user(&self, user_id: &str) -> StoreResult<Vec<Project>> {
        let filter = doc! { "$or": [ { "owner": user_id }, { "team": user_id } ] };
        let cursor = self.projects().find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn save(&self, project: &mut Project) -> StoreResult<()> {
        let expected = project.version;
        project.version = expected + 1;
        let filter = doc! { "_id": project.id.as_str(), "version": expected };

        match self.projects().replace_one(filter, &*project).await {
            Ok(res) if res.matched_count == 1 => {
                debug!("Saved project {} at version {}", project.id, project.version);
                Ok(())
            }
            Ok(_) => {
                project.version = expected;
                Err(StoreError::Conflict)
            }
            Err(e) => {
                project.version = expected;
                Err(e.into())
            }
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let res = self.projects().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }
}

#[async_trait]
impl MessageStore for MongoStore {
    async fn insert(&self, message: &Message) -> StoreResult<()> {
        self.messages().insert_one(message).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Message>> {
        Ok(self.messages().find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_project(&self, project_id: &str) -> StoreResult<Vec<Message>> {
        let cursor = self.messages().find(doc! { "project": project_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn add_reader(&self, id: &str, user_id: &str) -> StoreResult<Option<Message>> {
        let updated_at = to_bson(&Utc::now())?;
        let filter = doc! { "_id": id, "readBy": { "$ne": user_id } };
        let update = doc! {
            "$addToSet": { "readBy": user_id },
            "$set": { "updatedAt": updated_at },
        };
        let res = self.messages().update_one(filter, update).await?;
        if res.modified_count == 1 {
            debug!("Added reader {} to message {}", user_id, id);
        }
        Ok(self.messages().find_one(doc! { "_id": id }).await?)
    }

    async fn delete_by_project(&self, project_id: &str) -> StoreResult<u64> {
        let res = self.messages().delete_many(doc! { "project": project_id }).await?;
        Ok(res.deleted_count)
    }
}
