use serde_json::{Map, Value};
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Request-local error taxonomy. Every variant maps to exactly one HTTP
/// status; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    #[error("authentication required")]
    Unauthorized,
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("cache error: {0}")]
    Cache(String),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field-keyed body for 400 responses, plain message for the rest.
    pub fn to_body(&self) -> Value {
        match self {
            Self::Validation { field, message } => {
                let mut errors = Map::new();
                errors.insert(field.clone(), Value::String(message.clone()));
                let mut body = Map::new();
                body.insert("errors".to_string(), Value::Object(errors));
                Value::Object(body)
            }
            other => {
                let mut body = Map::new();
                body.insert("message".to_string(), Value::String(other.to_string()));
                Value::Object(body)
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::NotFound("row"),
            sqlx::Error::Database(e) => {
                // The storage-level unique constraint is the authoritative
                // guard; application checks in front of it are advisory.
                if e.code().as_deref() == Some("23505") {
                    Self::Conflict(e.to_string())
                } else {
                    Self::Database(e.to_string())
                }
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for ApiError {
    fn from(value: redis::RedisError) -> Self {
        Self::Cache(format!("{:?} - {:?}", value.code(), value.detail()))
    }
}

impl Reject for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            ApiError::validation("servings", "must be greater than 0").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("recipe").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("duplicate like".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Database("pool closed".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_body_is_keyed_by_field() {
        let body = ApiError::validation("ingredients", "invalid JSON").to_body();
        assert_eq!(body["errors"]["ingredients"], "invalid JSON");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
