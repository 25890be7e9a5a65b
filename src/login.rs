use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::{Session, Submitted};
use crate::user;
use crate::views;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login_form(session: Session) -> HttpResponse {
    session.render("Log In", &views::login_form())
}

pub async fn login_user(
    state: web::Data<AppState>,
    mut session: Session,
    req: Submitted<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let req = match req {
        Ok(req) => req.into_inner(),
        Err(err) => return Ok(session.reject_form(&err, "/login")),
    };
    let user = user::authenticate(state.users.as_ref(), &req.username, &req.password).await?;

    log::info!("{} logged in", user.username);
    session.start(&user.username);
    session.flash(format!("Welcome, {}", user.username));
    Ok(session.redirect(&format!("/profile/{}", user.username)))
}

/// Shows the logged-in user's profile. A path naming someone else is
/// redirected to the caller's own profile.
pub async fn profile(
    path: web::Path<String>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let identity = session.require()?;
    if path.into_inner() != identity.username() {
        return Ok(session.redirect(&format!("/profile/{}", identity.username())));
    }
    Ok(session.render("Profile", &views::profile(identity.username())))
}

pub async fn logout(mut session: Session) -> HttpResponse {
    if let Some(username) = session.current() {
        log::info!("{} logged out", username);
    }
    session.end();
    session.flash("You have been logged out");
    session.redirect("/login")
}
