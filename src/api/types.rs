//! Request and response payloads for the auth endpoints. OTP codes and tokens
//! pass through these types, so they must never be logged.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub struct SendOtpRequest<'a> {
    pub email: &'a str,
}

#[derive(Clone, Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Deserialize)]
pub struct VerifyOtpResponse {
    pub token: String,
}

/// Error body shape used by every endpoint: `{ "message": ... }`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}
