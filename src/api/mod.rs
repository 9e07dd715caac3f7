//! HTTP helpers for the notes API with consistent timeouts and error handling.
//! Feature clients go through [`ApiClient`] so request setup, bearer headers,
//! and error mapping live in one place. The client never stores tokens; callers
//! pass the token they just read from the session store.

pub mod types;

use crate::{error::Error, APP_USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use self::types::ErrorBody;

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// # Errors
    /// Returns `Error::Config` if `base_url` is not an absolute http(s) URL or
    /// the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| Error::Config(format!("invalid API URL '{base_url}': {err}")))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "unsupported API URL '{base_url}', expected http(s)://host[/prefix]"
            )));
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    ///
    /// # Errors
    /// Returns `Error::Config` if the base URL cannot take path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("API URL '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs JSON with a bearer token; `401` maps to `Error::SessionInvalid`.
    ///
    /// # Errors
    /// Returns transport, HTTP, or decode errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        token: &SecretString,
    ) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let request = self.http.get(url).bearer_auth(token.expose_secret());
        let response = send(request).await?;
        handle_json_response(response, true).await
    }

    /// POSTs JSON and parses a JSON response. With a token, `401` maps to
    /// `Error::SessionInvalid`.
    ///
    /// # Errors
    /// Returns transport, HTTP, or decode errors.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let mut request = self.http.post(url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = send(request).await?;
        handle_json_response(response, token.is_some()).await
    }

    /// POSTs JSON without a token and ignores the response body.
    ///
    /// # Errors
    /// Returns transport or HTTP errors.
    pub async fn post_json_empty<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), Error> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let response = send(self.http.post(url).json(body)).await?;
        handle_empty_response(response, false).await
    }

    /// DELETEs with a bearer token and ignores the response body.
    ///
    /// # Errors
    /// Returns transport or HTTP errors; `401` maps to `Error::SessionInvalid`.
    pub async fn delete(&self, segments: &[&str], token: &SecretString) -> Result<(), Error> {
        let url = self.endpoint(segments)?;
        debug!(%url, "DELETE");
        let request = self.http.delete(url).bearer_auth(token.expose_secret());
        let response = send(request).await?;
        handle_empty_response(response, true).await
    }
}

/// Maps transport errors into user-facing variants with timeout detection.
fn map_request_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout("Request timed out. Please try again.".to_string())
    } else {
        Error::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn send(request: RequestBuilder) -> Result<Response, Error> {
    request.send().await.map_err(|err| map_request_error(&err))
}

async fn handle_json_response<T: DeserializeOwned>(
    response: Response,
    authorized: bool,
) -> Result<T, Error> {
    if response.status().is_success() {
        response.json::<T>().await.map_err(|err| {
            error!("unexpected response shape: {err}");
            Error::Parse(format!("Failed to decode response: {err}"))
        })
    } else {
        Err(error_from_response(response, authorized).await)
    }
}

async fn handle_empty_response(response: Response, authorized: bool) -> Result<(), Error> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response, authorized).await)
    }
}

/// Builds the error for a non-success response. Authorized calls turn `401`
/// into `SessionInvalid`; everything else keeps the server `message` if any.
async fn error_from_response(response: Response, authorized: bool) -> Error {
    let status = response.status();
    if authorized && status == StatusCode::UNAUTHORIZED {
        debug!("authorized request rejected with 401");
        return Error::SessionInvalid;
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %sanitize_body(&body), "request failed");

    Error::Http {
        status: status.as_u16(),
        message: server_message(&body),
    }
}

/// Extracts `{ "message": ... }` from an error body, sanitized for display.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .map(|message| sanitize_body(&message))
        .filter(|message| !message.is_empty())
}

/// Trims and truncates error text for user-facing messages.
fn sanitize_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_CHARS).collect()
}
