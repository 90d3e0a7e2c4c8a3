//! Credential providers for the connector request.
//!
//! The connector authenticates the caller with whatever the transport can
//! present. Ambient (integrated) authentication is the default; basic and
//! pre-built `Authorization` headers cover hosts without one.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use wsfed_client_sdk::{CredentialProvider, HttpRequest, TransportError};

const AUTHORIZATION: &str = "Authorization";

/// Leaves the request untouched: the platform supplies the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientCredentials;

impl CredentialProvider for AmbientCredentials {
    fn apply(&self, _request: &mut HttpRequest) -> Result<(), TransportError> {
        Ok(())
    }
}

/// HTTP basic authentication.
#[derive(Debug)]
pub struct BasicCredentials {
    username: String,
    password: SecretString,
}

impl BasicCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl CredentialProvider for BasicCredentials {
    fn apply(&self, request: &mut HttpRequest) -> Result<(), TransportError> {
        if self.username.contains(':') {
            return Err(TransportError::Credentials(
                "basic auth username must not contain ':'".to_owned(),
            ));
        }
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            self.username,
            self.password.expose_secret()
        ));
        set_authorization(request, format!("Basic {encoded}"));
        Ok(())
    }
}

/// A ready-made `Authorization` header value, e.g. `Negotiate <token>`.
#[derive(Debug)]
pub struct HeaderCredentials {
    value: SecretString,
}

impl HeaderCredentials {
    #[must_use]
    pub fn new(value: SecretString) -> Self {
        Self { value }
    }
}

impl CredentialProvider for HeaderCredentials {
    fn apply(&self, request: &mut HttpRequest) -> Result<(), TransportError> {
        let value = self.value.expose_secret();
        if value.trim().is_empty() {
            return Err(TransportError::Credentials(
                "authorization header value is empty".to_owned(),
            ));
        }
        set_authorization(request, value.to_owned());
        Ok(())
    }
}

fn set_authorization(request: &mut HttpRequest, value: String) {
    request
        .headers
        .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
    request.headers.push((AUTHORIZATION.to_owned(), value));
}
