use crate::storage::CollectionKey;
use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access {key} collection: {source}")]
    Io {
        key: CollectionKey,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {key} collection: {source}")]
    Serialize {
        key: CollectionKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("{key} collection is corrupt: {source}")]
    Corrupt {
        key: CollectionKey,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl JournalError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
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
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        let status = match &err {
            JournalError::NotFound { .. } => StatusCode::NOT_FOUND,
            JournalError::Validation(_) => StatusCode::BAD_REQUEST,
            JournalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
