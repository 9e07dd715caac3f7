//! OTP sign-in handshake. The controller walks `Idle → AwaitingEmail →
//! OtpSent → Verified`, enforces the resend cooldown locally, and hands the
//! verified token back to the caller, who picks the session lifetime at that
//! moment. Codes and tokens must never be logged.

pub mod cooldown;

use crate::{
    api::{
        types::{SendOtpRequest, VerifyOtpRequest, VerifyOtpResponse},
        ApiClient,
    },
    error::Error,
    schedule::Scheduler,
    session::{Lifetime, SessionStore},
};
use secrecy::SecretString;
use std::{fmt, sync::Arc, time::SystemTime};
use tracing::{info, instrument, warn};

pub use self::cooldown::{Cooldown, RESEND_COOLDOWN_SECS};

const SEND_OTP: &[&str] = &["login", "send-otp"];
const VERIFY_OTP: &[&str] = &["login", "verify-otp"];

const MSG_EMAIL_REQUIRED: &str = "Please enter your email!";
const MSG_CODE_REQUIRED: &str = "Please enter OTP!";
const MSG_SEND_FAILED: &str = "Failed to send OTP";
const MSG_INVALID_CODE: &str = "Invalid OTP";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeState {
    Idle,
    AwaitingEmail,
    OtpSent,
    Verified,
}

impl fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingEmail => "awaiting email",
            Self::OtpSent => "otp sent",
            Self::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// An outstanding challenge for one account.
#[derive(Clone, Debug)]
pub struct OtpChallenge {
    pub account_id: String,
    pub sent_at: SystemTime,
    pub code_entered: String,
}

/// Token and account returned by a successful verification.
#[derive(Debug)]
pub struct VerifiedLogin {
    pub token: SecretString,
    pub account_id: String,
}

impl VerifiedLogin {
    /// Stores the credential with the lifetime chosen at verification time.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the session cannot be written.
    pub fn persist(self, store: &SessionStore, lifetime: Lifetime) -> Result<(), Error> {
        store.persist_session(self.token, &self.account_id, lifetime)
    }
}

pub struct OtpChallengeController {
    api: ApiClient,
    scheduler: Arc<dyn Scheduler>,
    state: ChallengeState,
    challenge: Option<OtpChallenge>,
    cooldown: Cooldown,
    cooldown_window: u64,
}

impl OtpChallengeController {
    #[must_use]
    pub fn new(api: ApiClient, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            api,
            scheduler,
            state: ChallengeState::Idle,
            challenge: None,
            cooldown: Cooldown::default(),
            cooldown_window: RESEND_COOLDOWN_SECS,
        }
    }

    #[must_use]
    pub fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_window = seconds;
        self
    }

    #[must_use]
    pub const fn state(&self) -> ChallengeState {
        self.state
    }

    #[must_use]
    pub fn challenge(&self) -> Option<&OtpChallenge> {
        self.challenge.as_ref()
    }

    #[must_use]
    pub fn cooldown_remaining(&self) -> u64 {
        self.cooldown.remaining()
    }

    /// The login view is shown and waiting for an email.
    pub fn begin(&mut self) {
        if self.state == ChallengeState::Idle {
            self.state = ChallengeState::AwaitingEmail;
        }
    }

    /// Requests an OTP for `email`. While a challenge is out this is the resend
    /// path and is refused locally until the cooldown reaches zero.
    ///
    /// # Errors
    /// `Validation` for an empty email, `CooldownActive` while cooling down,
    /// `InvalidState` once verified, `Challenge` when the server refuses, and
    /// transport errors as-is.
    #[instrument(skip(self, email))]
    pub async fn request_otp(&mut self, email: &str) -> Result<(), Error> {
        match self.state {
            ChallengeState::Idle | ChallengeState::AwaitingEmail => {}
            ChallengeState::OtpSent => {
                let remaining = self.cooldown.remaining();
                if remaining > 0 {
                    return Err(Error::CooldownActive { remaining });
                }
            }
            ChallengeState::Verified => return Err(Error::InvalidState(self.state)),
        }

        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Validation(MSG_EMAIL_REQUIRED.to_string()));
        }

        self.api
            .post_json_empty(SEND_OTP, &SendOtpRequest { email })
            .await
            .map_err(|err| challenge_error(err, MSG_SEND_FAILED))?;

        self.challenge = Some(OtpChallenge {
            account_id: email.to_string(),
            sent_at: SystemTime::now(),
            code_entered: String::new(),
        });
        self.state = ChallengeState::OtpSent;
        self.cooldown
            .start(self.scheduler.as_ref(), self.cooldown_window);

        info!(cooldown = self.cooldown_window, "otp sent");
        Ok(())
    }

    /// Requests a new OTP for the outstanding challenge's email.
    ///
    /// # Errors
    /// Same as [`Self::request_otp`]; `InvalidState` if no challenge is out.
    pub async fn resend_otp(&mut self) -> Result<(), Error> {
        let Some(email) = self
            .challenge
            .as_ref()
            .map(|challenge| challenge.account_id.clone())
        else {
            return Err(Error::InvalidState(self.state));
        };
        self.request_otp(&email).await
    }

    /// Submits `code` for `email`. On success the challenge is discarded and
    /// the cooldown stops; on rejection only the entered code is cleared.
    ///
    /// # Errors
    /// `InvalidState` outside `OtpSent`, `Validation` for an empty code,
    /// `Challenge` when the server refuses, and transport errors as-is.
    #[instrument(skip(self, email, code))]
    pub async fn verify_otp(&mut self, email: &str, code: &str) -> Result<VerifiedLogin, Error> {
        if self.state != ChallengeState::OtpSent {
            return Err(Error::InvalidState(self.state));
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Validation(MSG_CODE_REQUIRED.to_string()));
        }

        let email = email.trim();
        if let Some(challenge) = self.challenge.as_mut() {
            challenge.code_entered = code.to_string();
        }

        let result: Result<VerifyOtpResponse, Error> = self
            .api
            .post_json(VERIFY_OTP, &VerifyOtpRequest { email, otp: code }, None)
            .await;

        match result {
            Ok(response) if !response.token.is_empty() => {
                self.cooldown.cancel();
                self.challenge = None;
                self.state = ChallengeState::Verified;
                info!("otp verified");
                Ok(VerifiedLogin {
                    token: SecretString::from(response.token),
                    account_id: email.to_string(),
                })
            }
            Ok(_) => {
                warn!("verify-otp succeeded without a token");
                self.clear_code();
                Err(Error::Parse("Login response did not include a token".to_string()))
            }
            Err(err) => {
                self.clear_code();
                Err(challenge_error(err, MSG_INVALID_CODE))
            }
        }
    }

    /// Stops the cooldown ticker; used when the login view goes away.
    pub fn teardown(&mut self) {
        self.cooldown.cancel();
    }

    fn clear_code(&mut self) {
        if let Some(challenge) = self.challenge.as_mut() {
            challenge.code_entered.clear();
        }
    }
}

impl Drop for OtpChallengeController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Server rejections become `Challenge` with the server message, or
/// `fallback` when the body had none. Transport failures pass through.
fn challenge_error(err: Error, fallback: &str) -> Error {
    match err {
        Error::Http { message, .. } => {
            Error::Challenge(message.unwrap_or_else(|| fallback.to_string()))
        }
        other => other,
    }
}
