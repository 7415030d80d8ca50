//! Request-level error taxonomy.
//!
//! Each variant maps one failure class from the resolve pipeline to an HTTP
//! status; the body shape is `{"detail": "..."}` to stay wire-compatible
//! with the service this one replaces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// The model returned the refusal sentinel: client should rephrase.
    QuestionTooVague,
    /// The completion was not a SELECT statement.
    NotSelect,
    /// The database rejected the generated query; carries the engine detail
    /// since the failure is attributed to bad generation, not the server.
    QueryRejected(String),
    /// The language-model service could not be reached or errored. The
    /// detail is logged server-side, the client gets a fixed message.
    LlmUnavailable,
    /// No database connection could be acquired.
    DatabaseUnavailable,
    /// Anything else (blocking-task failures and the like).
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::QuestionTooVague => {
                write!(f, "The question is too vague. Please be more specific.")
            }
            ApiError::NotSelect => {
                write!(f, "Operation not allowed: only SELECT queries are permitted.")
            }
            ApiError::QueryRejected(detail) => {
                write!(f, "The generated query is invalid. Error: {}", detail)
            }
            ApiError::LlmUnavailable => {
                write!(f, "Could not reach the AI service.")
            }
            ApiError::DatabaseUnavailable => {
                write!(f, "Database service unavailable.")
            }
            ApiError::Internal(detail) => {
                write!(f, "Internal error: {}", detail)
            }
        }
    }
}

impl Error for ApiError {}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::QuestionTooVague => StatusCode::BAD_REQUEST,
            ApiError::NotSelect => StatusCode::FORBIDDEN,
            ApiError::QueryRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::LlmUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
