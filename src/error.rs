use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::session;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Incorrect Username and/or Password")]
    InvalidCredentials,

    #[error("Invalid username. Allowed characters: a-z, 0-9, -, _")]
    InvalidUsername,

    #[error("Task not found")]
    NotFound,

    #[error("Please log in first")]
    Unauthenticated,

    #[error("You can only manage your own tasks")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(err.to_string())
    }
}

impl AppError {
    /// Where the user is sent back to when this error ends a request.
    fn redirect_target(&self) -> Option<&'static str> {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => Some("/login"),
            AppError::UsernameTaken | AppError::InvalidUsername => Some("/register"),
            AppError::NotFound | AppError::Forbidden => Some("/get_tasks"),
            AppError::Database(_) | AppError::PasswordHash(_) | AppError::Config(_) => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.redirect_target() {
            Some(_) => StatusCode::FOUND,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.redirect_target() {
            Some(location) => {
                let mut builder = HttpResponse::Found();
                builder.insert_header((header::LOCATION, location));
                // session::keep_pending_flash merges this with any message still pending
                session::set_cookie(&mut builder, &session::flash_cookie(&[self.to_string()]));
                builder.finish()
            }
            None => {
                log::error!("{}", self);
                HttpResponse::InternalServerError().body("Something went wrong, please try again.")
            }
        }
    }
}
