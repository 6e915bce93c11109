use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::review_desk::DeskError;
use crate::services::scorecard::ReportError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DeskError> for ApiError {
    fn from(err: DeskError) -> Self {
        let detail = err.to_string();
        match err {
            DeskError::BatchInProgress
            | DeskError::AssistInFlight
            | DeskError::Superseded
            | DeskError::NotSaved => Self::Conflict(detail),
            DeskError::NotEditing => Self::NotFound(detail),
            DeskError::MissingRowId => Self::BadRequest(detail),
            DeskError::Scoring(_) => Self::BadGateway(detail),
            DeskError::Store(_) => Self::ServiceUnavailable(detail),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        Self::NotFound(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadGateway(message) | ApiError::ServiceUnavailable(message) => {
                tracing::warn!(error = %message, status = status.as_u16(), "Upstream dependency failed");
                message
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
        };

        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::ScoringError;

    #[test]
    fn desk_errors_map_to_http_statuses() {
        let cases = [
            (DeskError::BatchInProgress, StatusCode::CONFLICT),
            (DeskError::AssistInFlight, StatusCode::CONFLICT),
            (DeskError::NotEditing, StatusCode::NOT_FOUND),
            (DeskError::MissingRowId, StatusCode::BAD_REQUEST),
            (
                DeskError::Scoring(ScoringError::Transport("timeout".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (DeskError::NotSaved, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}
