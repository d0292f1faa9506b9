use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use emporium_crypto::CryptoError;
use emporium_store::StoreError;
use serde_json::json;
use tracing::{debug, error};

/// Errors surfaced by services and HTTP handlers.
///
/// Each variant maps to one HTTP status. Client errors carry a message that is
/// safe to return; store, crypto and internal failures are logged and answered
/// with a generic message.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request is malformed or violates a business rule.
    #[error("{message}")]
    Validation { message: String },

    /// Missing, invalid or expired credentials.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The caller is authenticated but not allowed to do this.
    #[error("{message}")]
    Forbidden { message: String },

    /// The entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The `X-Tenant-Id` header names a tenant that is not registered.
    #[error("Unknown tenant '{tenant}'")]
    UnknownTenant { tenant: String },

    /// The request conflicts with the current state.
    #[error("{message}")]
    Conflict { message: String },

    /// The uploaded payload exceeds the configured limit.
    #[error("Payload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The uploaded content type is not accepted.
    #[error("{message}")]
    UnsupportedMediaType { message: String },

    /// Document store failure.
    #[error("Store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    /// Cryptographic failure.
    #[error("Crypto error: {source}")]
    Crypto {
        #[from]
        source: CryptoError,
    },

    /// A stored document does not match its model.
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Filesystem failure outside the store.
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Any other server-side failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The HTTP status this error is answered with.
    pub const fn status(&self) -> StatusCode {
        match *self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } | Self::UnknownTenant { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Store { ref source } => store_status(source),
            Self::Crypto { .. } | Self::Serialization { .. } | Self::Io { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

const fn store_status(error: &StoreError) -> StatusCode {
    match *error {
        StoreError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::DocumentAlreadyExists { .. } | StoreError::UniqueViolation { .. } => StatusCode::CONFLICT,
        StoreError::InvalidDocumentId { .. } | StoreError::InvalidPatch { .. } => StatusCode::BAD_REQUEST,
        StoreError::Io { .. } |
        StoreError::Json { .. } |
        StoreError::Crypto { .. } |
        StoreError::InvalidCollectionName { .. } |
        StoreError::HashVerificationFailed { .. } |
        StoreError::StoreCorruption { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_owned()
        }
        else {
            debug!("Request rejected with {}: {}", status, self);
            self.to_string()
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
