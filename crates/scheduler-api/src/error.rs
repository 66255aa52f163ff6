// Maps `scheduler_core::SchedulerError` onto HTTP responses (§4.7, spec.md
// §7 "User-visible"): a stable `detail` string plus the status the error
// kind implies. This is the one seam every handler funnels its store/engine
// errors through, the way the teacher funnels `sqlx::Error` into
// `StatusCode` in its own handlers -- except here the domain already has a
// typed error, so the mapping is exhaustive rather than a blanket 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scheduler_core::SchedulerError;
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

pub struct AppError(pub StatusCode, pub String);

impl AppError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        AppError(StatusCode::NOT_FOUND, detail.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        AppError(StatusCode::BAD_REQUEST, detail.into())
    }
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        let status = match &err {
            SchedulerError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulerError::Duplicate(_) => StatusCode::CONFLICT,
            SchedulerError::SandboxViolation(_) => StatusCode::BAD_REQUEST,
            SchedulerError::UnknownType(_) => StatusCode::BAD_REQUEST,
            SchedulerError::Store(_) | SchedulerError::Serialization(_) | SchedulerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError(status, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError(status, detail) = self;
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(detail = %detail, "request failed");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
