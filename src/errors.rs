use crate::storage::StoreError;
use crate::widgets::BoardError;
use axum::{http::StatusCode, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("no progress found for user {0}")]
    UnknownUser(String),
    #[error("report must have a score of at most 100 and exactly 3 tips")]
    InvalidReport,
    #[error("add some widgets to your board before archiving it")]
    EmptyBoard,
    #[error("the board was archived or changed while its report was being generated")]
    DayChanged,
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::DuplicateAccount | ServiceError::DayChanged => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::UnknownUser(_) => StatusCode::NOT_FOUND,
            ServiceError::Board(BoardError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Board(_) | ServiceError::InvalidReport | ServiceError::EmptyBoard => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Store(_) => {
                tracing::error!("storage failure: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
