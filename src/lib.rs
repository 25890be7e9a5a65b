//! A small task manager: users register, log in, and file tasks under categories.

use std::sync::Arc;

use sqlx::SqlitePool;

pub mod access;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod login;
pub mod register;
pub mod routes;
pub mod session;
pub mod task;
pub mod user;
pub mod views;

use access::AccessPolicy;
use category::{CategoryStore, SqliteCategoryStore};
use config::Config;
use session::SessionKey;
use task::{SqliteTaskStore, TaskStore};
use user::{SqliteUserStore, UserStore};

/// Shared by every request through `web::Data`.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub task_access: AccessPolicy,
    pub session_key: SessionKey,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        AppState {
            users: Arc::new(SqliteUserStore::new(pool.clone())),
            tasks: Arc::new(SqliteTaskStore::new(pool.clone())),
            categories: Arc::new(SqliteCategoryStore::new(pool)),
            task_access: config.task_access,
            session_key: SessionKey::from_secret(&config.secret_key),
        }
    }
}
