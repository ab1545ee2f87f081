use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::{AppState, auth::current_session};

const LOGIN_PAGE: &str = include_str!("../assets/login.html");
const DASHBOARD_PAGE: &str = include_str!("../assets/dashboard.html");
const APP_JS: &str = include_str!("../assets/app.js");

pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Redirect {
    if current_session(&state, &jar).await.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some((_, handle)) = current_session(&state, &jar).await else {
        return Redirect::to("/login").into_response();
    };
    let username = handle.lock().await.username.clone();

    Html(render_dashboard(&username)).into_response()
}

pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// Dashboard markup for `username`, escaped for an HTML text node.
fn render_dashboard(username: &str) -> String {
    DASHBOARD_PAGE.replace("{{username}}", &html_escape::encode_safe(username))
}
