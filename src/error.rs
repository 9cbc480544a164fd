use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad category of an [`Error`].
///
/// The concrete details, when there are any, live in the boxed source and can be
/// recovered with [`Error::downcast_ref`] (e.g. [`Status`] for [`Kind::Status`]).
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Connection, DNS or TLS failure while talking to the exchange.
    Transport,
    /// The exchange answered with a non-success HTTP status.
    Status,
    /// The response body was not valid JSON.
    Decode,
    /// A derived lookup (e.g. a market by currency pair) found nothing.
    NotFound,
    /// The remote operation is not supported by this client.
    Unsupported,
    /// Invalid caller input or an unexpected response shape.
    Validation,
    /// Failure inside the client itself (encoding, key setup).
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let source = self.source.as_deref()?;
        source.downcast_ref::<E>()
    }

    #[must_use]
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    #[must_use]
    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    #[must_use]
    pub fn market_not_found<P: Into<String>, S: Into<String>>(primary: P, secondary: S) -> Self {
        MarketNotFound {
            primary: primary.into(),
            secondary: secondary.into(),
        }
        .into()
    }

    #[must_use]
    pub fn unsupported(operation: &'static str) -> Self {
        Unsupported { operation }.into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{:?}: {source}", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Non-success response from the exchange.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Status, err)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

/// No market in the exchange's market list matches the requested currency pair.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketNotFound {
    pub primary: String,
    pub secondary: String,
}

impl fmt::Display for MarketNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market not found: {}/{}", self.primary, self.secondary)
    }
}

impl StdError for MarketNotFound {}

impl From<MarketNotFound> for Error {
    fn from(err: MarketNotFound) -> Self {
        Error::with_source(Kind::NotFound, err)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub operation: &'static str,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation `{}` is not supported", self.operation)
    }
}

impl StdError for Unsupported {}

impl From<Unsupported> for Error {
    fn from(err: Unsupported) -> Self {
        Error::with_source(Kind::Unsupported, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Decode, e)
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(e: serde_html_form::ser::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<hmac::digest::InvalidLength> for Error {
    fn from(e: hmac::digest::InvalidLength) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_should_downcast() {
        let err = Error::status(
            StatusCode::BAD_GATEWAY,
            Method::POST,
            "/api".to_owned(),
            "upstream down",
        );

        assert_eq!(err.kind(), Kind::Status);
        let status = err.downcast_ref::<Status>().expect("status source");
        assert_eq!(status.status_code, StatusCode::BAD_GATEWAY);
        assert_eq!(status.path, "/api");
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn market_not_found_should_name_pair() {
        let err = Error::market_not_found("XXX", "YYY");

        assert_eq!(err.kind(), Kind::NotFound);
        assert_eq!(err.to_string(), "NotFound: market not found: XXX/YYY");
    }

    #[test]
    fn unsupported_should_name_operation() {
        let err = Error::unsupported("generatenewaddress");

        assert_eq!(err.kind(), Kind::Unsupported);
        assert_eq!(
            err.downcast_ref::<Unsupported>().map(|u| u.operation),
            Some("generatenewaddress")
        );
    }

    #[test]
    fn decode_error_should_map_to_decode_kind() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::from(json_err);

        assert_eq!(err.kind(), Kind::Decode);
        assert!(err.inner().is_some());
    }
}
