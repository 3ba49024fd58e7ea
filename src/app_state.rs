use std::sync::Arc;

use crate::config::Config;
use crate::db::MongoDB;
use crate::store::mongo::MongoStore;
use crate::store::{MessageStore, ProjectStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub messages: Arc<dyn MessageStore>,
    pub config: Config,
}

impl AppState {
    pub fn with_mongo(mongodb: &MongoDB, config: Config) -> Self {
        let store = Arc::new(MongoStore::new(mongodb.db.clone()));
        AppState {
            users: store.clone(),
            projects: store.clone(),
            messages: store,
            config,
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn in_memory() -> Self {
        let store = Arc::new(crate::store::memory::MemoryStore::new());
        AppState {
            users: store.clone(),
            projects: store.clone(),
            messages: store,
            config: Config::for_tests(),
        }
    }
}
