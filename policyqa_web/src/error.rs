use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] policyqa_core::Error),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    const fn status_and_code(&self) -> (StatusCode, &'static str) {
        use policyqa_core::Error as Domain;

        match self {
            Self::Domain(e) => {
                let status = match e {
                    Domain::EmptyDocument | Domain::Extraction(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    Domain::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    Domain::NoDocument => StatusCode::CONFLICT,
                    Domain::NoQuestion => StatusCode::BAD_REQUEST,
                    Domain::Llm(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.code())
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            Self::Internal(details) => {
                tracing::error!("Internal error: {details}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "success": false,
                "code": code,
                "message": message,
            })),
        )
            .into_response()
    }
}
