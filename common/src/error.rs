use actix_web::{http::StatusCode, HttpResponse};
use derive_more::Display;
use serde_json::json;

/// Error taxonomy shared by every service operation. The kind decides the
/// HTTP status; the inner anyhow error carries the human-readable cause.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    ValidationError,
    InvalidRole,
    InvalidState,
    InvalidTransition,
    Conflict,
    Timeout,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidRole => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::InvalidState | ErrorKind::InvalidTransition | ErrorKind::Conflict => {
                StatusCode::CONFLICT
            }
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ServiceError {
    kind: ErrorKind,
    err: anyhow::Error,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.err)
    }
}

impl actix_web::error::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        self.kind.status()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "kind": self.kind.to_string(),
            "error": self.err.to_string(),
        }))
    }
}

impl<E: Into<anyhow::Error>> From<E> for ServiceError {
    fn from(err: E) -> ServiceError {
        ServiceError {
            kind: ErrorKind::Internal,
            err: err.into(),
        }
    }
}

/// Attaches a kind to an anyhow error: `anyhow!("no such ticket").kind(NotFound)`.
pub trait AddKind {
    fn kind(self, kind: ErrorKind) -> ServiceError;
}

impl AddKind for anyhow::Error {
    fn kind(self, kind: ErrorKind) -> ServiceError {
        ServiceError { kind, err: self }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
