//! Cookie-backed login sessions and flash messages.
//!
//! The logged-in username lives in a signed `session` cookie, so a client cannot
//! forge another identity. Flash messages travel in a plain `flash` cookie across
//! one redirect and are cleared once a page has shown them.

use actix_web::cookie::{Cookie, CookieBuilder, CookieJar, Key, SameSite};
use actix_web::dev::{Payload, ServiceResponse};
use actix_web::http::header::{self, ContentType, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder};
use futures::future::{ready, Ready};
use sha2::{Digest, Sha512};

use crate::error::AppError;
use crate::views;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

const INVALID_FORM: &str = "Please fill in every required field";

/// A form body that may have failed to parse. Handlers check the session before
/// looking at it, so anonymous posts are sent to the login page either way.
pub type Submitted<T> = Result<web::Form<T>, actix_web::Error>;

/// Signing key for the session cookie.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        SessionKey(Key::from(digest.as_slice()))
    }

    fn verify(&self, cookie: Cookie<'static>) -> Option<String> {
        let name = cookie.name().to_string();
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        jar.signed(&self.0).get(&name).map(|c| c.value().to_string())
    }

    fn sign(&self, cookie: Cookie<'static>) -> Vec<Cookie<'static>> {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.0).add(cookie);
        jar.delta().cloned().collect()
    }
}

/// The authenticated user a protected operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Identity(username.into())
    }

    pub fn username(&self) -> &str {
        &self.0
    }
}

pub struct Session {
    key: SessionKey,
    username: Option<String>,
    incoming_flash: Vec<String>,
    outgoing_flash: Vec<String>,
    cookies: Vec<Cookie<'static>>,
}

impl Session {
    pub fn from_request_parts(req: &HttpRequest, key: SessionKey) -> Self {
        let username = req
            .cookie(SESSION_COOKIE)
            .and_then(|cookie| key.verify(cookie));

        let incoming_flash = req
            .cookie(FLASH_COOKIE)
            .map(|cookie| parse_flash(cookie.value()))
            .unwrap_or_default();

        Session {
            key,
            username,
            incoming_flash,
            outgoing_flash: Vec::new(),
            cookies: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn require(&self) -> Result<Identity, AppError> {
        self.username
            .as_ref()
            .map(|username| Identity::new(username.clone()))
            .ok_or(AppError::Unauthenticated)
    }

    pub fn start(&mut self, username: &str) {
        self.username = Some(username.to_string());
        let cookie = base_cookie(SESSION_COOKIE, username.to_string());
        let signed = self.key.sign(cookie);
        self.cookies.extend(signed);
    }

    /// Logs the client out. Ending an anonymous session is a no-op.
    pub fn end(&mut self) {
        if self.username.take().is_some() {
            self.cookies.push(removal_cookie(SESSION_COOKIE));
        }
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.outgoing_flash.push(message.into());
    }

    /// Sends the user back to `location` after a form body could not be parsed.
    pub fn reject_form(mut self, err: &actix_web::Error, location: &str) -> HttpResponse {
        log::warn!("rejected form submission: {}", err);
        self.flash(INVALID_FORM);
        self.redirect(location)
    }

    pub fn redirect(mut self, location: &str) -> HttpResponse {
        if !self.outgoing_flash.is_empty() {
            let mut messages = std::mem::take(&mut self.incoming_flash);
            messages.append(&mut self.outgoing_flash);
            self.cookies.push(flash_cookie(&messages));
        }
        let mut builder = HttpResponse::Found();
        builder.insert_header((header::LOCATION, location));
        self.finish(builder, String::new())
    }

    /// Renders a page inside the site layout, consuming any pending flash messages.
    pub fn render(mut self, title: &str, body: &str) -> HttpResponse {
        if !self.incoming_flash.is_empty() {
            self.cookies.push(removal_cookie(FLASH_COOKIE));
        }
        let mut messages = std::mem::take(&mut self.incoming_flash);
        messages.append(&mut self.outgoing_flash);

        let page = views::layout(title, self.current(), &messages, body);
        let mut builder = HttpResponse::Ok();
        builder.content_type(ContentType::html());
        self.finish(builder, page)
    }

    fn finish(self, mut builder: HttpResponseBuilder, body: String) -> HttpResponse {
        for cookie in &self.cookies {
            set_cookie(&mut builder, cookie);
        }
        builder.body(body)
    }
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req
            .app_data::<web::Data<AppState>>()
            .map(|state| Session::from_request_parts(req, state.session_key.clone()))
            .ok_or_else(|| AppError::Config("application state is not registered".to_string()));
        ready(session)
    }
}

fn base_cookie(name: &'static str, value: String) -> Cookie<'static> {
    CookieBuilder::new(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

/// Appends a percent-encoded `Set-Cookie` header, matching how actix parses request cookies.
pub(crate) fn set_cookie(builder: &mut HttpResponseBuilder, cookie: &Cookie<'_>) {
    builder.append_header((header::SET_COOKIE, cookie.encoded().to_string()));
}

pub(crate) fn flash_cookie(messages: &[String]) -> Cookie<'static> {
    let value = serde_json::to_string(messages).unwrap_or_default();
    base_cookie(FLASH_COOKIE, value)
}

fn parse_flash(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}

/// Error redirects are built without the request, so a flash message that was
/// still waiting to be shown gets folded back into them here.
pub fn keep_pending_flash<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::FOUND, merge_pending_flash)
}

fn merge_pending_flash<B>(
    mut res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    if res.response().error().is_some() {
        let mut messages = res
            .request()
            .cookie(FLASH_COOKIE)
            .map(|cookie| parse_flash(cookie.value()))
            .unwrap_or_default();

        if !messages.is_empty() {
            let raised: Vec<String> = res
                .response()
                .cookies()
                .find(|cookie| cookie.name() == FLASH_COOKIE)
                .map(|cookie| parse_flash(cookie.value()))
                .unwrap_or_default();
            messages.extend(raised);

            let merged = flash_cookie(&messages);
            if let Ok(value) = HeaderValue::from_str(&merged.encoded().to_string()) {
                let headers = res.response_mut().headers_mut();
                headers.remove(header::SET_COOKIE);
                headers.insert(header::SET_COOKIE, value);
            }
        }
    }
    Ok(ErrorHandlerResponse::Response(res.map_into_left_body()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const SECRET: &str = "a test secret that is long enough for signing";

    fn session_with(cookies: Vec<Cookie<'static>>) -> Session {
        let mut req = TestRequest::default();
        for cookie in cookies {
            req = req.cookie(cookie);
        }
        Session::from_request_parts(&req.to_http_request(), SessionKey::from_secret(SECRET))
    }

    fn response_cookies(resp: &HttpResponse) -> Vec<Cookie<'static>> {
        resp.cookies().map(|c| c.into_owned()).collect()
    }

    #[test]
    fn anonymous_without_cookie() {
        let session = session_with(vec![]);
        assert_eq!(session.current(), None);
        assert!(matches!(session.require(), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn started_session_survives_a_round_trip() {
        let mut session = session_with(vec![]);
        session.start("alice");
        assert_eq!(session.current(), Some("alice"));

        let resp = session.redirect("/profile/alice");
        let next = session_with(response_cookies(&resp));
        assert_eq!(next.current(), Some("alice"));
        assert_eq!(next.require().unwrap(), Identity::new("alice"));
    }

    #[test]
    fn unsigned_session_cookie_is_ignored() {
        let forged = base_cookie(SESSION_COOKIE, "alice".to_string());
        let session = session_with(vec![forged]);
        assert_eq!(session.current(), None);
    }

    #[test]
    fn cookie_signed_with_another_secret_is_ignored() {
        let other = SessionKey::from_secret("some entirely different secret value here");
        let signed = other.sign(base_cookie(SESSION_COOKIE, "alice".to_string()));
        let session = session_with(signed);
        assert_eq!(session.current(), None);
    }

    #[test]
    fn ending_an_anonymous_session_is_a_no_op() {
        let mut session = session_with(vec![]);
        session.end();
        assert_eq!(session.current(), None);
        let resp = session.redirect("/login");
        assert_eq!(response_cookies(&resp).len(), 0);
    }

    #[test]
    fn flash_is_shown_once_after_redirect() {
        let mut session = session_with(vec![]);
        session.flash("Task Successfully Added");
        let resp = session.redirect("/get_tasks");
        let cookies = response_cookies(&resp);

        let next = session_with(cookies);
        assert_eq!(next.incoming_flash, vec!["Task Successfully Added".to_string()]);

        let page = next.render("Tasks", "");
        let removal = response_cookies(&page)
            .into_iter()
            .find(|c| c.name() == FLASH_COOKIE)
            .unwrap();
        assert_eq!(removal.value(), "");
    }
}
