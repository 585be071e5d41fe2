use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// JSON envelope every non-2xx API response carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: ErrorCode::from_status(status),
            message: message.into(),
        }
    }

    /// Builds the error for a non-2xx response. The envelope message wins when
    /// it parses and is non-blank; otherwise the message is derived from the
    /// status line.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        let extracted = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|envelope| envelope.error.trim().to_string())
            .filter(|message| !message.is_empty());

        match extracted {
            Some(message) => Self::new(status, message),
            None => {
                let message = match reason {
                    Some(reason) if !reason.is_empty() => {
                        format!("Request failed: {status} {reason}")
                    }
                    _ => format!("Request failed: {status}"),
                };
                Self::new(status, message)
            }
        }
    }
}
