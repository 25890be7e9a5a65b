use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::{Session, Submitted};
use crate::user;
use crate::views;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

pub async fn register_form(session: Session) -> HttpResponse {
    session.render("Register", &views::register_form())
}

/// Creates the account and logs the new user straight in.
pub async fn register_user(
    state: web::Data<AppState>,
    mut session: Session,
    req: Submitted<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let req = match req {
        Ok(req) => req.into_inner(),
        Err(err) => return Ok(session.reject_form(&err, "/register")),
    };
    match user::register(state.users.as_ref(), &req.username, &req.password).await {
        Ok(user) => {
            session.start(&user.username);
            session.flash("Registration Successful!");
            Ok(session.redirect(&format!("/profile/{}", user.username)))
        }
        Err(err @ (AppError::UsernameTaken | AppError::InvalidUsername)) => {
            session.flash(err.to_string());
            Ok(session.render("Register", &views::register_form()))
        }
        Err(err) => Err(err),
    }
}
