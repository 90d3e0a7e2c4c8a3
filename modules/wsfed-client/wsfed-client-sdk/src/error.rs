//! Error types for the WS-Federation client.

use std::fmt;

use thiserror::Error;

/// Steps of the handshake state machine, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// Variant A: authorize request issued with redirects disabled.
    AuthorizeRequested,
    /// Variant B: WS-Federation and authorize endpoints queried for cookies.
    CookiesSeeded,
    /// Connector queried with ambient credentials.
    ConnectorQueried,
    /// `wresult` extracted from the connector form.
    FormExtracted,
    /// `wresult` posted to the login callback.
    CallbackPosted,
    /// Variant B: identity provider `wresult` extracted from the callback body.
    ResponseFormExtracted,
    /// Terminal output decoded into claims.
    ResultDecoded,
}

impl HandshakeStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizeRequested => "authorize_requested",
            Self::CookiesSeeded => "cookies_seeded",
            Self::ConnectorQueried => "connector_queried",
            Self::FormExtracted => "form_extracted",
            Self::CallbackPosted => "callback_posted",
            Self::ResponseFormExtracted => "response_form_extracted",
            Self::ResultDecoded => "result_decoded",
        }
    }
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network or HTTP-level failure of a single exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a status the step does not accept.
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// Connection, TLS or body read failure.
    #[error("{method} {url} failed: {message}")]
    Io {
        method: &'static str,
        url: String,
        message: String,
    },

    /// A redirect-disabled step expected a `Location` header.
    #[error("response from {url} carries no Location header")]
    MissingLocation { url: String },

    /// A redirect chain walked by the client did not settle.
    #[error("redirect chain starting at {url} exceeded {limit} hops")]
    TooManyRedirects { url: String, limit: u32 },

    /// A URL could not be parsed or resolved.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The credential provider could not prepare the request.
    #[error("credential provider failed: {0}")]
    Credentials(String),
}

/// Failure to read the `wresult` field out of an HTML form.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("no input named '{field}' in document")]
    FieldMissing { field: String },

    #[error("input '{field}' has no '{attribute}' attribute")]
    AttributeMissing { field: String, attribute: String },

    #[error("unable to parse html: {0}")]
    Markup(String),
}

/// Failure to turn a token response into a [`crate::SecurityToken`].
#[derive(Debug, Error)]
pub enum TokenError {
    /// No namespace-qualified `Assertion` element in the response.
    #[error("no SAML assertion found")]
    AssertionNotFound,

    /// Structural XML or SAML failure.
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Error returned by a handshake run.
///
/// Every variant names the stage that failed and keeps the underlying cause
/// as its `source`, so the whole chain is reported as one error.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("authorize request failed")]
    AuthorizeFailed(#[source] TransportError),

    #[error("unable to acquire identity provider cookies")]
    CookieAcquisitionFailed(#[source] TransportError),

    #[error("connector is unreachable")]
    ConnectorUnreachable(#[source] TransportError),

    #[error("connector authentication failed")]
    ConnectorAuthFailed(#[source] TransportError),

    #[error("unable to find a value for 'wresult'")]
    WresultNotFound {
        stage: HandshakeStage,
        #[source]
        source: FormError,
    },

    #[error("error processing login response")]
    CallbackFailed(#[source] TransportError),

    #[error("malformed login callback response: {0}")]
    MalformedCallbackResponse(String),

    #[error("no SAML assertion found in token response")]
    AssertionNotFound,

    #[error("unable to parse security token: {0}")]
    TokenParseError(String),
}

impl HandshakeError {
    /// Stage at which the handshake stopped.
    #[must_use]
    pub fn stage(&self) -> HandshakeStage {
        match self {
            Self::AuthorizeFailed(_) => HandshakeStage::AuthorizeRequested,
            Self::CookieAcquisitionFailed(_) => HandshakeStage::CookiesSeeded,
            Self::ConnectorUnreachable(_) | Self::ConnectorAuthFailed(_) => {
                HandshakeStage::ConnectorQueried
            }
            Self::WresultNotFound { stage, .. } => *stage,
            Self::CallbackFailed(_) => HandshakeStage::CallbackPosted,
            Self::MalformedCallbackResponse(_)
            | Self::AssertionNotFound
            | Self::TokenParseError(_) => HandshakeStage::ResultDecoded,
        }
    }
}

impl From<TokenError> for HandshakeError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::AssertionNotFound => Self::AssertionNotFound,
            TokenError::Malformed(reason) => Self::TokenParseError(reason),
        }
    }
}
