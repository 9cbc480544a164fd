#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod api;
pub mod auth;
pub mod error;

use reqwest::blocking::{Client as ReqwestClient, Request};
use serde_json::Value;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Private API endpoint. Every operation is a `POST` to this single URL.
pub const DEFAULT_HOST: &str = "https://api.cryptsy.com/api";

/// Environment variable read by [`auth::Credentials::from_env`] for the public key.
pub const KEY_VAR: &str = "CRYPTSY_API_KEY";
/// Environment variable read by [`auth::Credentials::from_env`] for the secret.
pub const SECRET_VAR: &str = "CRYPTSY_API_SECRET";

/// Executes an already signed request and decodes the body as untyped JSON.
///
/// Non-success statuses surface as [`error::Kind::Status`] carrying the raw body;
/// they are never parsed as if they were a result.
pub(crate) fn request(client: &ReqwestClient, request: Request) -> Result<Value> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request)?;
    let status_code = response.status();

    if !status_code.is_success() {
        let message = response.text().unwrap_or_default();

        #[cfg(feature = "tracing")]
        tracing::warn!(
            status = %status_code,
            method = %method,
            path = %path,
            message = %message,
            "API request failed"
        );

        return Err(Error::status(status_code, method, path, message));
    }

    let text = response.text()?;
    Ok(serde_json::from_str(&text)?)
}
