use shared::{
    error::{ApiError, ErrorCode},
    validation::ValidationError,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Every failure the synchronization layer reports. All variants collapse to
/// a single human-readable message for display; none is retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never reached the server or its response never arrived
    /// intact (connect failure, timeout, unreadable body).
    #[error("{0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("{}", .0.message)]
    Server(ApiError),
    /// A local precondition failed before any request was issued.
    #[error("{0}")]
    Precondition(String),
}

impl ClientError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server(api) => Some(api.status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Server(api) => Some(api.code),
            _ => None,
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(value: ApiError) -> Self {
        Self::Server(value)
    }
}

impl From<ValidationError> for ClientError {
    fn from(value: ValidationError) -> Self {
        Self::Precondition(value.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Transport(format!("request timed out: {value}"))
        } else if value.is_decode() {
            Self::Transport(format!("failed to decode response: {value}"))
        } else {
            Self::Transport(format!("request failed: {value}"))
        }
    }
}
