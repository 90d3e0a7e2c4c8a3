//! Backend traits for the WS-Federation handshake.
//!
//! The handshake driver only sequences requests and routes cookies; the
//! transport, the ambient credential mechanism and both parsers are
//! injected through these traits so each can be replaced independently.

use crate::error::{FormError, TokenError, TransportError};
use crate::models::{HttpRequest, HttpResponse, SecurityToken};

/// Blocking HTTP transport.
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange and return the fully read response.
    ///
    /// Implementations return `Ok` for every HTTP status; the caller decides
    /// which statuses a step accepts. Redirects are followed only when the
    /// request's [`crate::RedirectPolicy`] is `Follow`.
    ///
    /// # Errors
    ///
    /// - `Io` for connection, TLS or body read failures
    /// - `InvalidUrl` if the request URL cannot be used
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Ambient credential mechanism used against the connector.
///
/// Only connector requests pass through the provider; identity provider
/// requests carry cookies instead.
pub trait CredentialProvider: Send + Sync {
    /// Attach credentials to `request`.
    ///
    /// # Errors
    ///
    /// - `Credentials` if no credential can be produced
    fn apply(&self, request: &mut HttpRequest) -> Result<(), TransportError>;
}

/// Document query over an HTML page.
pub trait FormFieldQuery: Send + Sync {
    /// Raw value of `attribute` on the first `<input>` whose `name` is `field`.
    ///
    /// The value is returned exactly as written in the markup; entity
    /// decoding is left to the caller.
    ///
    /// # Errors
    ///
    /// - `FieldMissing` if no such input exists
    /// - `AttributeMissing` if the input lacks `attribute`
    /// - `Markup` if the document cannot be parsed at all
    fn input_attribute(&self, html: &str, field: &str, attribute: &str)
    -> Result<String, FormError>;
}

/// SAML assertion parser.
pub trait AssertionParser: Send + Sync {
    /// Parse the first namespace-qualified `Assertion` found in `xml`.
    ///
    /// # Errors
    ///
    /// - `AssertionNotFound` if the document holds no assertion
    /// - `Malformed` on XML or SAML structure errors
    fn parse(&self, xml: &str) -> Result<SecurityToken, TokenError>;
}
