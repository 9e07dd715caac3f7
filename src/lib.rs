//! # Jotpad (notes client with OTP sign in)
//!
//! `jotpad` signs a user in through a one-time passcode sent to their email,
//! keeps the resulting bearer token in one of two storage lifetimes, and
//! manages the user's notes through the remote notes API.
//!
//! ## Session lifecycle
//!
//! 1. **Challenge:** [`otp::OtpChallengeController`] POSTs the email to
//!    `/login/send-otp` and starts a 30 second resend cooldown.
//! 2. **Verify:** the code goes to `/login/verify-otp`; the returned token is
//!    written into [`session::SessionStore`] with the lifetime the user picks
//!    at that moment (persistent file or process memory).
//! 3. **Guard:** every navigation runs [`routes::decide`] against session
//!    presence.
//! 4. **Use:** [`notes::NotesClient`] and [`profile::ProfileFetcher`] read the
//!    token at call time. A `401` clears the session and redirects to `/login`.
//!
//! The `jotpad` binary wraps all of this in [`shell::Shell`], a line-based
//! front end that walks the same routes.
//!
//! Tokens are bearer credentials: they are held as `SecretString` and must never
//! be logged.

pub mod api;
pub mod cli;
pub mod dashboard;
pub mod error;
pub mod notes;
pub mod otp;
pub mod profile;
pub mod routes;
pub mod schedule;
pub mod session;
pub mod shell;

pub use error::Error;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
