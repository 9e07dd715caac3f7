use crate::otp::ChallengeState;
use thiserror::Error;

/// Fallback shown when the server rejects a request without a usable body.
pub const GENERIC_FAILURE: &str = "Request failed.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required field was empty; never reaches the network.
    #[error("{0}")]
    Validation(String),
    /// The server rejected an OTP request or verification.
    #[error("{0}")]
    Challenge(String),
    #[error("Resend OTP in {remaining}s")]
    CooldownActive { remaining: u64 },
    #[error("operation not allowed while the challenge is {0}")]
    InvalidState(ChallengeState),
    /// An authorized call was rejected; the session must be dropped.
    #[error("Session is no longer valid, please sign in again")]
    SessionInvalid,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Http {
        status: u16,
        message: Option<String>,
    },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Server-supplied message of an HTTP failure, if it carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_session_invalid(&self) -> bool {
        matches!(self, Self::SessionInvalid)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
