use crate::session::StorageError;
use crate::transport::TransportError;
use thiserror::Error;

/// Every failure the request pipeline can surface to a caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected our credentials and the session could not be refreshed. The
    /// session has already been cleared by the time a caller sees this.
    #[error("unauthorized")]
    Unauthorized,

    #[error("request failed (status {status}): {message}")]
    Request { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status associated with this error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[test]
fn test_error_status() {
    assert_eq!(ApiError::Unauthorized.status(), Some(401));
    assert!(ApiError::Unauthorized.is_unauthorized());
    let err = ApiError::Request {
        status: 404,
        message: "Skill not found".to_string(),
    };
    assert_eq!(err.status(), Some(404));
    assert_eq!(
        err.to_string(),
        "request failed (status 404): Skill not found"
    );
    assert_eq!(ApiError::InvalidRequest("x".to_string()).status(), None);
}
