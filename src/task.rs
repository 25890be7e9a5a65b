use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::AppError;
use crate::session::Identity;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Task {
    pub id: String,
    pub category_name: String,
    pub task_name: String,
    pub task_description: String,
    pub due_date: String,
    pub is_urgent: bool,
    pub owner_username: String,
}

/// Everything about a task the user can edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub category_name: String,
    pub task_name: String,
    pub task_description: String,
    pub due_date: String,
    pub is_urgent: bool,
}

impl Task {
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            category_name: self.category_name.clone(),
            task_name: self.task_name.clone(),
            task_description: self.task_description.clone(),
            due_date: self.due_date.clone(),
            is_urgent: self.is_urgent,
        }
    }
}

/// The add/edit task form. An unchecked checkbox is simply absent from the body.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub category_name: String,
    pub task_name: String,
    #[serde(default)]
    pub task_description: String,
    pub due_date: String,
    pub is_urgent: Option<String>,
}

impl From<TaskForm> for TaskFields {
    fn from(form: TaskForm) -> Self {
        TaskFields {
            category_name: form.category_name,
            task_name: form.task_name,
            task_description: form.task_description,
            due_date: form.due_date,
            is_urgent: form.is_urgent.is_some(),
        }
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task from every user, oldest first.
    async fn list_all(&self) -> Result<Vec<Task>, AppError>;

    async fn create(&self, fields: TaskFields, owner: &Identity) -> Result<Task, AppError>;

    async fn get(&self, task_id: &str) -> Result<Task, AppError>;

    /// Replaces the whole record, stamping `owner` as the new owner.
    async fn update(
        &self,
        task_id: &str,
        fields: TaskFields,
        owner: &Identity,
    ) -> Result<Task, AppError>;

    async fn delete(&self, task_id: &str) -> Result<(), AppError>;
}

pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Ids that are not well-formed UUIDs cannot name a stored task.
fn parse_id(task_id: &str) -> Result<String, AppError> {
    Uuid::parse_str(task_id)
        .map(|id| id.to_string())
        .map_err(|_| AppError::NotFound)
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT id, category_name, task_name, task_description, due_date, is_urgent, owner_username
             FROM tasks ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn create(&self, fields: TaskFields, owner: &Identity) -> Result<Task, AppError> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            category_name: fields.category_name,
            task_name: fields.task_name,
            task_description: fields.task_description,
            due_date: fields.due_date,
            is_urgent: fields.is_urgent,
            owner_username: owner.username().to_string(),
        };

        sqlx::query(
            "INSERT INTO tasks (id, category_name, task_name, task_description, due_date, is_urgent, owner_username)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.category_name)
        .bind(&task.task_name)
        .bind(&task.task_description)
        .bind(&task.due_date)
        .bind(task.is_urgent)
        .bind(&task.owner_username)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    async fn get(&self, task_id: &str) -> Result<Task, AppError> {
        let id = parse_id(task_id)?;
        sqlx::query_as::<_, Task>(
            "SELECT id, category_name, task_name, task_description, due_date, is_urgent, owner_username
             FROM tasks WHERE id = ?",
        )
        .bind(&id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn update(
        &self,
        task_id: &str,
        fields: TaskFields,
        owner: &Identity,
    ) -> Result<Task, AppError> {
        let id = parse_id(task_id)?;
        let task = Task {
            id,
            category_name: fields.category_name,
            task_name: fields.task_name,
            task_description: fields.task_description,
            due_date: fields.due_date,
            is_urgent: fields.is_urgent,
            owner_username: owner.username().to_string(),
        };

        let rows_affected = sqlx::query(
            "UPDATE tasks SET category_name = ?, task_name = ?, task_description = ?,
             due_date = ?, is_urgent = ?, owner_username = ? WHERE id = ?",
        )
        .bind(&task.category_name)
        .bind(&task.task_name)
        .bind(&task.task_description)
        .bind(&task.due_date)
        .bind(task.is_urgent)
        .bind(&task.owner_username)
        .bind(&task.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(task)
    }

    async fn delete(&self, task_id: &str) -> Result<(), AppError> {
        let id = parse_id(task_id)?;
        let rows_affected = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(&id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn fields(name: &str, urgent: bool) -> TaskFields {
        TaskFields {
            category_name: "Work".to_string(),
            task_name: name.to_string(),
            task_description: "write it down".to_string(),
            due_date: "01 January, 2024".to_string(),
            is_urgent: urgent,
        }
    }

    async fn store() -> SqliteTaskStore {
        SqliteTaskStore::new(db::memory_pool().await)
    }

    #[actix_web::test]
    async fn created_task_is_owned_by_the_creator() {
        let store = store().await;
        let alice = Identity::new("alice");
        let task = store.create(fields("Ship", true), &alice).await.unwrap();

        let fetched = store.get(&task.id).await.unwrap();
        assert_eq!(fetched.owner_username, "alice");
        assert_eq!(fetched, task);
    }

    #[actix_web::test]
    async fn update_replaces_every_field() {
        let store = store().await;
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");
        let task = store.create(fields("Ship", true), &alice).await.unwrap();

        let replacement = TaskFields {
            category_name: "Home".to_string(),
            task_name: "Paint".to_string(),
            task_description: String::new(),
            due_date: "02 February, 2024".to_string(),
            is_urgent: false,
        };
        store
            .update(&task.id, replacement.clone(), &bob)
            .await
            .unwrap();

        let fetched = store.get(&task.id).await.unwrap();
        assert_eq!(fetched.fields(), replacement);
        assert_eq!(fetched.owner_username, "bob");
    }

    #[actix_web::test]
    async fn deleted_task_is_gone() {
        let store = store().await;
        let task = store
            .create(fields("Ship", false), &Identity::new("alice"))
            .await
            .unwrap();

        store.delete(&task.id).await.unwrap();
        assert!(matches!(store.get(&task.id).await, Err(AppError::NotFound)));
        assert!(matches!(store.delete(&task.id).await, Err(AppError::NotFound)));
    }

    #[actix_web::test]
    async fn malformed_and_unknown_ids_are_not_found() {
        let store = store().await;
        let alice = Identity::new("alice");
        let unknown = Uuid::new_v4().to_string();

        assert!(matches!(store.get("not-an-id").await, Err(AppError::NotFound)));
        assert!(matches!(store.get(&unknown).await, Err(AppError::NotFound)));
        assert!(matches!(
            store.update(&unknown, fields("x", false), &alice).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(store.delete("42").await, Err(AppError::NotFound)));
    }

    #[actix_web::test]
    async fn list_all_includes_every_owner() {
        let store = store().await;
        store
            .create(fields("First", false), &Identity::new("alice"))
            .await
            .unwrap();
        store
            .create(fields("Second", true), &Identity::new("bob"))
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.task_name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn checkbox_presence_sets_urgency() {
        let form = TaskForm {
            category_name: "Work".to_string(),
            task_name: "Ship".to_string(),
            task_description: String::new(),
            due_date: "2024-01-01".to_string(),
            is_urgent: Some("on".to_string()),
        };
        assert!(TaskFields::from(form).is_urgent);

        let form = TaskForm {
            category_name: "Work".to_string(),
            task_name: "Ship".to_string(),
            task_description: String::new(),
            due_date: "2024-01-01".to_string(),
            is_urgent: None,
        };
        assert!(!TaskFields::from(form).is_urgent);
    }
}
