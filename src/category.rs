use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: String,
    pub category_name: String,
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories, sorted by name.
    async fn list(&self) -> Result<Vec<Category>, AppError>;

    /// Names are not required to be unique.
    async fn create(&self, category_name: &str) -> Result<Category, AppError>;
}

pub struct SqliteCategoryStore {
    pool: SqlitePool,
}

impl SqliteCategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for SqliteCategoryStore {
    async fn list(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, category_name FROM categories ORDER BY category_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn create(&self, category_name: &str) -> Result<Category, AppError> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            category_name: category_name.to_string(),
        };

        sqlx::query("INSERT INTO categories (id, category_name) VALUES (?, ?)")
            .bind(&category.id)
            .bind(&category.category_name)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[actix_web::test]
    async fn list_is_sorted_regardless_of_insertion_order() {
        let store = SqliteCategoryStore::new(db::memory_pool().await);
        for name in ["Work", "Home", "Shopping", "Errands"] {
            store.create(name).await.unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.category_name)
            .collect();
        assert_eq!(names, vec!["Errands", "Home", "Shopping", "Work"]);
    }

    #[actix_web::test]
    async fn duplicate_names_are_kept() {
        let store = SqliteCategoryStore::new(db::memory_pool().await);
        let first = store.create("Work").await.unwrap();
        let second = store.create("Work").await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
