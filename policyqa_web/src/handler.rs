use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use policyqa_core::DocumentMetadata;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{AppState, Error, RequireSession, Result};

struct Upload {
    filename: String,
    bytes: Bytes,
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(e.body_text())
    } else {
        Error::BadRequest(e.body_text())
    }
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(sanitize_filename).unwrap_or_default();
        if filename.is_empty() {
            return Err(Error::BadRequest("No file selected".to_string()));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload { filename, bytes });
    }

    Err(Error::BadRequest("No file uploaded".to_string()))
}

/// Extract the uploaded file and make it the session's document.
///
/// Replacing the document also clears the chat log.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    session: RequireSession,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart.map_err(|e| Error::BadRequest(e.body_text()))?;
    let Upload { filename, bytes } = read_file_field(&mut multipart).await?;
    let size_bytes = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    debug!("Session {} uploading {filename} ({size_bytes} bytes)", session.id);

    // PDF parsing is CPU bound.
    let extractor = Arc::clone(&state.extractor);
    let name = filename.clone();
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes, &name))
        .await
        .map_err(|e| Error::Internal(format!("extraction task failed: {e}")))??;

    let metadata =
        DocumentMetadata::derive(&filename, size_bytes, extracted.file_type, &extracted.text);
    let text = extracted.text;

    let mut guard = session.handle.lock().await;
    guard.context.seed(text.clone(), metadata.clone())?;
    drop(guard);

    info!(
        "Session {} loaded {} ({}, {} chars, {} words)",
        session.id, metadata.filename, metadata.file_type, metadata.char_count, metadata.word_count
    );

    Ok(Json(json!({
        "success": true,
        "text": text,
        "length": metadata.char_count,
        "metadata": metadata,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    question: String,
}

/// Answer a question about the session's document.
///
/// The session stays locked for the whole model round-trip, so two asks
/// on one session are answered one after the other.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    session: RequireSession,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;

    let mut guard = session.handle.lock().await;
    let turn = state
        .conversation
        .ask(&mut guard.context, &request.question)
        .await?;
    drop(guard);

    Ok(Json(json!({
        "success": true,
        "answer": turn.answer(),
        "turn": turn.turn_number,
    })))
}

pub async fn history(session: RequireSession) -> Json<Value> {
    let guard = session.handle.lock().await;
    Json(json!({
        "success": true,
        "history": guard.context.history(),
    }))
}

pub async fn clear_chat(session: RequireSession) -> Json<Value> {
    session.handle.lock().await.context.clear_chat();
    debug!("Cleared chat log for session {}", session.id);
    Json(json!({ "success": true }))
}
