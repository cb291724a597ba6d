use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Dataset contains no records")]
    EmptyDataset,

    #[error("Dataset needs at least 2 distinct titles to recommend against, found {num_contents}")]
    DegenerateLabel { num_contents: usize },

    #[error("No data loaded")]
    NotInitialized,

    #[error("Content '{0}' not found")]
    NotFound(String),

    #[error("Model output width {actual} does not match dataset size {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DataFormat(_)
            | AppError::Parse(_)
            | AppError::EmptyDataset
            | AppError::DegenerateLabel { .. }
            | AppError::InvalidInput(_)
            | AppError::NotInitialized => StatusCode::BAD_REQUEST,
            AppError::ShapeMismatch { .. } | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed with internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (AppError::Parse("abc".to_string()), StatusCode::BAD_REQUEST),
            (AppError::DegenerateLabel { num_contents: 1 }, StatusCode::BAD_REQUEST),
            (AppError::NotInitialized, StatusCode::BAD_REQUEST),
            (
                AppError::ShapeMismatch { expected: 3, actual: 2 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_not_found_message_names_title() {
        let error = AppError::NotFound("Nope".to_string());
        assert_eq!(error.to_string(), "Content 'Nope' not found");
    }
}
