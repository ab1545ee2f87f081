//! Login, logout and the session extractor.

use axum::{
    Form, Json,
    extract::{FromRef, FromRequestParts, Request, State, rejection::FormRejection},
    http::{HeaderValue, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use policyqa_core::{Authenticator, util::verify_password};
use policyqa_session::{SessionHandle, SessionId, SessionState};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use time::Duration as TimeDuration;
use tracing::{info, warn};

use crate::{AppState, Error, Result};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Username to Argon2 password hash table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    users: HashMap<String, String>,
}

impl CredentialTable {
    /// Build from `(username, PHC password hash)` pairs.
    pub fn new<I, U, H>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            users: users
                .into_iter()
                .map(|(u, h)| (u.into(), h.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authenticator for CredentialTable {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| verify_password(password, stored))
    }
}

/// Session cookie carrying a full idle-TTL `Max-Age`.
fn session_cookie(state: &AppState, session_id: &SessionId) -> Cookie<'static> {
    let ttl_minutes =
        i64::try_from(state.settings.session_ttl.as_secs() / 60).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.settings.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(ttl_minutes))
        .build()
}

/// Re-issue the session cookie on every request made with a live session.
///
/// The server-side TTL slides on each lookup, so the browser's copy has to slide with it.
/// Responses that already set a cookie (login, logout) are left alone.
pub async fn refresh_session_cookie(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if response.headers().contains_key(SET_COOKIE) {
        return response;
    }

    if let Some((session_id, _)) = current_session(&state, &jar).await {
        match HeaderValue::from_str(&session_cookie(&state, &session_id).to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Cannot refresh cookie for session {session_id}: {e}"),
        }
    }
    response
}

/// Look up the live session referenced by the request's cookie.
pub async fn current_session(
    state: &AppState,
    jar: &CookieJar,
) -> Option<(SessionId, SessionHandle)> {
    let id = SessionId::new(jar.get(SESSION_COOKIE)?.value().to_string());
    let handle = state.sessions.get(&id).await?;
    Some((id, handle))
}

/// Extractor for routes that need a logged-in session.
///
/// Rejects with a JSON 401 when the cookie is missing, unknown or expired.
pub struct RequireSession {
    pub id: SessionId,
    pub handle: SessionHandle,
}

impl<S> FromRequestParts<S> for RequireSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let (id, handle) = current_session(&app_state, &jar)
            .await
            .ok_or(Error::Unauthorized)?;
        Ok(Self { id, handle })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Check credentials and start a new session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: std::result::Result<Form<LoginForm>, FormRejection>,
) -> Result<impl IntoResponse> {
    let Form(form) = form.map_err(|e| Error::BadRequest(e.body_text()))?;

    // Argon2 verification is CPU bound.
    let authenticator = Arc::clone(&state.authenticator);
    let (username, password) = (form.username.clone(), form.password);
    let verified = tokio::task::spawn_blocking(move || authenticator.verify(&username, &password))
        .await
        .map_err(|e| Error::Internal(format!("credential check failed: {e}")))?;

    if !verified {
        warn!("Failed login for user: {}", form.username);
        return Err(Error::InvalidCredentials);
    }

    // A new login never reuses an existing session id.
    if let Some(old) = jar.get(SESSION_COOKIE) {
        state
            .sessions
            .delete(&SessionId::new(old.value().to_string()))
            .await;
    }

    let session = SessionState::new(form.username.clone(), state.new_context());
    let session_id = session.id.clone();
    state.sessions.put(session).await;
    info!("User {} logged in (session {session_id})", form.username);

    let cookie = session_cookie(&state, &session_id);
    Ok((jar.add(cookie), Json(json!({ "success": true }))))
}

/// Drop the session and its cookie, then go back to the login page.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::new(cookie.value().to_string());
        if state.sessions.delete(&session_id).await {
            info!("Logged out session {session_id}");
        }
    }

    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), Redirect::to("/login"))
}
