use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use sqlx::{FromRow, SqlitePool};

use crate::error::AppError;

// SQLITE_CONSTRAINT_PRIMARYKEY and SQLITE_CONSTRAINT_UNIQUE
const UNIQUE_VIOLATION_CODES: [&str; 2] = ["1555", "2067"];

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-z0-9_-]+$").unwrap();
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UsernameTaken` when the username is already stored.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    async fn find(&self, username: &str) -> Result<Option<User>, AppError>;
}

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err
                    .code()
                    .map_or(false, |code| UNIQUE_VIOLATION_CODES.contains(&code.as_ref()))
                    || db_err.message().contains("UNIQUE constraint failed") =>
            {
                Err(AppError::UsernameTaken)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

/// Creates an account. The username is stored lowercased.
pub async fn register(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let username = normalize_username(username);
    if !is_valid_username(&username) {
        return Err(AppError::InvalidUsername);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    let user = User {
        username,
        password_hash,
    };
    store.insert(&user).await?;
    log::info!("registered user {}", user.username);
    Ok(user)
}

/// Unknown users and wrong passwords are indistinguishable to the caller.
pub async fn authenticate(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let username = normalize_username(username);
    let user = match store.find(&username).await? {
        Some(user) => user,
        None => {
            log::warn!("login attempt for unknown user {}", username);
            return Err(AppError::InvalidCredentials);
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        log::warn!("wrong password for user {}", username);
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> SqliteUserStore {
        SqliteUserStore::new(db::memory_pool().await)
    }

    #[test]
    fn username_rules() {
        assert!(is_valid_username("alice_01"));
        assert!(is_valid_username("bob-smith"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("alice smith"));
        assert!(!is_valid_username("Alice"));
        assert_eq!(normalize_username("  Alice "), "alice");
    }

    #[actix_web::test]
    async fn register_lowercases_and_hashes() {
        let store = store().await;
        let user = register(&store, "Alice", "pw123").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw123");
        assert!(user.password_hash.starts_with("$argon2"));

        let stored = store.find("alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
    }

    #[actix_web::test]
    async fn usernames_differing_in_case_collide() {
        let store = store().await;
        register(&store, "alice", "pw123").await.unwrap();
        let err = register(&store, "ALICE", "other").await.unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));
    }

    #[actix_web::test]
    async fn invalid_username_is_rejected() {
        let store = store().await;
        let err = register(&store, "not valid!", "pw123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUsername));
    }

    #[actix_web::test]
    async fn authenticate_checks_password() {
        let store = store().await;
        register(&store, "alice", "pw123").await.unwrap();

        let user = authenticate(&store, "alice", "pw123").await.unwrap();
        assert_eq!(user.username, "alice");

        let err = authenticate(&store, "alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[actix_web::test]
    async fn unknown_user_gets_the_same_error() {
        let store = store().await;
        let err = authenticate(&store, "nobody", "pw123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
