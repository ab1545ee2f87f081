use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use policyqa_conversation::{ConversationConfig, ConversationManager};
use policyqa_core::{LLMProvider, LLMResponse, util::hash_password};
use policyqa_extract::DocumentExtractor;
use policyqa_session::InMemorySessionStore;
use policyqa_web::{AppState, CredentialTable, WebSettings, router};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tower::ServiceExt;

const POLICY_TEXT: &str = "Vacation policy: 20 days per year.";

struct StubProvider {
    answer: &'static str,
}

#[async_trait]
impl LLMProvider for StubProvider {
    async fn generate(&self, _prompt: &str, _model: &str) -> anyhow::Result<LLMResponse> {
        Ok(LLMResponse {
            content: self.answer.to_string(),
            usage: None,
        })
    }

    fn get_default_model(&self) -> &str {
        "stub"
    }
}

struct FailingProvider;

#[async_trait]
impl LLMProvider for FailingProvider {
    async fn generate(&self, _prompt: &str, _model: &str) -> anyhow::Result<LLMResponse> {
        anyhow::bail!("service unavailable")
    }

    fn get_default_model(&self) -> &str {
        "failing"
    }
}

/// Argon2 hash of the test password, computed once per test binary.
fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("yourpassword").unwrap())
}

fn app_with_settings(provider: Arc<dyn LLMProvider>, settings: WebSettings) -> Router {
    let state = AppState {
        sessions: Arc::new(InMemorySessionStore::new(Duration::from_secs(3600))),
        extractor: Arc::new(DocumentExtractor::new()),
        authenticator: Arc::new(CredentialTable::new([("abhay", password_hash())])),
        conversation: ConversationManager::new(provider, ConversationConfig::default()),
        settings,
    };
    router(Arc::new(state))
}

fn app_with(provider: Arc<dyn LLMProvider>) -> Router {
    app_with_settings(provider, WebSettings::default())
}

fn app() -> Router {
    app_with(Arc::new(StubProvider {
        answer: "## Vacation\n- **20 days** per year",
    }))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

/// Log in and return the `session=...` pair to send back as a cookie.
async fn login(app: &Router) -> String {
    let response = send(app, login_request("abhay", "yourpassword")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    set_cookie.split(';').next().unwrap().to_string()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(COOKIE, cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(cookie: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "policyqa-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(COOKIE, cookie)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let app = app();
    let response = send(&app, login_request("abhay", "yourpassword")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert_eq!(json_body(response).await["success"], true);
}

#[tokio::test]
async fn authenticated_requests_refresh_the_cookie() {
    let app = app();
    let cookie = login(&app).await;

    let response = send(&app, get("/history", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with(&format!("{cookie};")));
    assert!(set_cookie.contains("Max-Age=3600"));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn unknown_session_gets_no_cookie() {
    let app = app();
    let response = send(&app, get("/history", Some("session=not-a-session"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let app = app();
    let response = send(&app, login_request("abhay", "wrong")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn ask_requires_login() {
    let app = app();
    let response = send(
        &app,
        post_json("/ask", "session=not-a-session", r#"{"question":"Hi?"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn pages_redirect_by_login_state() {
    let app = app();

    let response = send(&app, get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");

    let response = send(&app, get("/", None)).await;
    assert_eq!(response.headers()[LOCATION], "/login");

    let cookie = login(&app).await;
    let response = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(response.headers()[LOCATION], "/dashboard");

    let response = send(&app, get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Signed in as abhay"));
}

#[tokio::test]
async fn ask_before_upload_is_a_conflict() {
    let app = app();
    let cookie = login(&app).await;

    let response = send(
        &app,
        post_json("/ask", &cookie, r#"{"question":"How many vacation days?"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["message"], "No document uploaded");
}

#[tokio::test]
async fn upload_then_ask_records_history() {
    let app = app();
    let cookie = login(&app).await;

    let response = send(
        &app,
        upload_request(&cookie, "policy.txt", POLICY_TEXT.as_bytes()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], POLICY_TEXT);
    assert_eq!(body["length"], 34);
    assert_eq!(body["metadata"]["filename"], "policy.txt");
    assert_eq!(body["metadata"]["word_count"], 6);
    assert_eq!(body["metadata"]["file_type"], "TXT");

    let response = send(
        &app,
        post_json("/ask", &cookie, r#"{"question":"How many vacation days?"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["answer"], "## Vacation\n- **20 days** per year");
    assert_eq!(body["turn"], 1);

    let body = json_body(send(&app, get("/history", Some(&cookie))).await).await;
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["question"], "How many vacation days?");

    let response = send(&app, post_json("/clear", &cookie, "{}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(send(&app, get("/history", Some(&cookie))).await).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let app = app();
    let cookie = login(&app).await;
    send(
        &app,
        upload_request(&cookie, "policy.txt", POLICY_TEXT.as_bytes()),
    )
    .await;

    let response = send(&app, post_json("/ask", &cookie, r#"{"question":"   "}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "No question provided");
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let app = app();
    let cookie = login(&app).await;

    let response = send(&app, upload_request(&cookie, "notes.json", b"{}")).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let settings = WebSettings {
        max_upload_bytes: 64,
        ..WebSettings::default()
    };
    let app = app_with_settings(Arc::new(StubProvider { answer: "unused" }), settings);
    let cookie = login(&app).await;

    let response = send(&app, upload_request(&cookie, "policy.txt", &[b'a'; 4096])).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn upload_without_filename_is_rejected() {
    let app = app();
    let cookie = login(&app).await;

    let response = send(&app, upload_request(&cookie, "", b"text")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "No file selected");
}

#[tokio::test]
async fn provider_failure_leaves_history_unchanged() {
    let app = app_with(Arc::new(FailingProvider));
    let cookie = login(&app).await;
    send(
        &app,
        upload_request(&cookie, "policy.txt", POLICY_TEXT.as_bytes()),
    )
    .await;

    let response = send(
        &app,
        post_json("/ask", &cookie, r#"{"question":"How many vacation days?"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = json_body(send(&app, get("/history", Some(&cookie))).await).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app();
    let cookie = login(&app).await;

    let response = send(&app, get("/logout", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");

    let response = send(&app, get("/history", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_do_not_share_documents() {
    let app = app();
    let first = login(&app).await;
    let second = login(&app).await;
    assert_ne!(first, second);

    send(
        &app,
        upload_request(&first, "policy.txt", POLICY_TEXT.as_bytes()),
    )
    .await;

    let response = send(&app, post_json("/ask", &second, r#"{"question":"Days?"}"#)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
