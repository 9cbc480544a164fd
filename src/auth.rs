//! Request signing for the private API.
//!
//! Every private call is a form-encoded `POST`. Before it is sent the signer appends a
//! `nonce` field to the body, then computes `HMAC-SHA512(secret, body)` over the final
//! body and attaches two headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `Key`  | the public API key, verbatim |
//! | `Sign` | lowercase hex HMAC digest of the exact body bytes sent |

use std::fmt;

use hmac::{Hmac, Mac as _};
use reqwest::blocking::{Body, Request};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret as _, SecretString};
use sha2::Sha512;

use crate::error::Error;
use crate::{KEY_VAR, Result, SECRET_VAR};

pub const KEY_HEADER: &str = "Key";
pub const SIGN_HEADER: &str = "Sign";

type HmacSha512 = Hmac<Sha512>;

/// API key pair issued by the exchange. Immutable once built.
#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new<K: Into<String>>(key: K, secret: SecretString) -> Self {
        Self {
            key: key.into(),
            secret,
        }
    }

    /// Reads the key pair from [`KEY_VAR`] and [`SECRET_VAR`].
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(KEY_VAR)
            .map_err(|e| Error::validation(format!("{KEY_VAR} is not usable: {e}")))?;
        let secret = std::env::var(SECRET_VAR)
            .map_err(|e| Error::validation(format!("{SECRET_VAR} is not usable: {e}")))?;

        Ok(Self::new(key, SecretString::from(secret)))
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Finalizes `request` for the wire: appends `nonce` to its form body and sets the
/// `Key` / `Sign` headers computed over the resulting body.
pub(crate) fn sign(credentials: &Credentials, request: &mut Request, nonce: u64) -> Result<()> {
    let mut body = request
        .body()
        .and_then(Body::as_bytes)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();

    if !body.is_empty() {
        body.push('&');
    }
    body.push_str("nonce=");
    body.push_str(&nonce.to_string());

    let signature = hmac(&credentials.secret, &body)?;

    let mut key = HeaderValue::from_str(&credentials.key)?;
    key.set_sensitive(true);
    let mut sign = HeaderValue::from_str(&signature)?;
    sign.set_sensitive(true);

    let headers = request.headers_mut();
    headers.insert(KEY_HEADER, key);
    headers.insert(SIGN_HEADER, sign);
    *request.body_mut() = Some(Body::from(body));

    Ok(())
}

/// Lowercase hex `HMAC-SHA512` of `message` keyed with the raw secret bytes.
pub fn hmac(secret: &SecretString, message: &str) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret.expose_secret().as_bytes())?;
    mac.update(message.as_bytes());

    Ok(format!("{:x}", mac.finalize().into_bytes()))
}
