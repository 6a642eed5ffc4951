use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use word_bank::{QuizMode, WordId};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unknown quiz type: {0}")]
    UnknownQuizMode(String),
    #[error("quiz type {0} does not take answers here")]
    UnsupportedQuizMode(QuizMode),
    #[error("authentication required")]
    Unauthorized,
    #[error("invalid token")]
    InvalidToken,
    #[error("learning block not found: {0}")]
    BlockNotFound(String),
    #[error("word not found: {0}")]
    WordNotFound(WordId),
    #[error("no score recorded for word {0}")]
    ScoreNotFound(WordId),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownQuizMode(_) | AppError::UnsupportedQuizMode(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::BlockNotFound(_) | AppError::WordNotFound(_) | AppError::ScoreNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Storage(e) => {
                log::error!("storage error: {e}");
                "internal error".to_string()
            }
            other => {
                log::debug!("rejecting request: {other}");
                other.to_string()
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
