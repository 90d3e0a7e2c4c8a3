//! Domain models for the WS-Federation client.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Claims decoded from the fragment of the terminal callback `Location`.
///
/// Exactly one value per claim name (`access_token`, `token_type`, ...).
pub type FragmentClaims = BTreeMap<String, String>;

/// Claims flattened from the attribute statements of a SAML assertion.
///
/// Values of attributes sharing a name are merged in document order.
pub type TokenClaims = BTreeMap<String, Vec<String>>;

/// Identity provider settings shared by both handshake variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProvider {
    /// Identity provider host, e.g. `tenant.auth0.com`.
    pub domain: String,
    pub client_id: String,
    /// Name of the enterprise connection backed by the connector.
    pub connection: String,
}

impl IdentityProvider {
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        connection: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            connection: connection.into(),
        }
    }
}

/// Inputs of the direct-authorize handshake (implicit grant, token in fragment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectAuthorizeConfig {
    pub identity_provider: IdentityProvider,
    /// Redirect URI registered for the client. Never dereferenced.
    pub callback_url: String,
    pub scope: String,
}

impl DirectAuthorizeConfig {
    pub const DEFAULT_CALLBACK_URL: &'static str = "http://headless.local";
    pub const DEFAULT_SCOPE: &'static str = "openid";

    /// Config with the default scope and callback URL.
    #[must_use]
    pub fn new(identity_provider: IdentityProvider) -> Self {
        Self {
            identity_provider,
            callback_url: Self::DEFAULT_CALLBACK_URL.to_owned(),
            scope: Self::DEFAULT_SCOPE.to_owned(),
        }
    }
}

/// Inputs of the connector handshake (WS-Federation, SAML token result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub identity_provider: IdentityProvider,
    /// Base URL of the connector, e.g. `https://connector.corp.local:8443`.
    pub connector_url: String,
    /// Identity provider tenant name, used in the `urn:auth0:{tenant}` realm.
    pub tenant: String,
}

/// A cookie captured from a `Set-Cookie` response header.
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of a redirect-disabled request: where it pointed and what it set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectResult {
    pub location: String,
    pub cookies: Vec<Cookie>,
}

/// HTML-decoded federation result extracted from a WS-Federation form.
///
/// Holds a signed security token; the value is redacted from `Debug`.
#[derive(Debug)]
pub struct Wresult(SecretString);

impl Wresult {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Raw token text.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Parsed SAML assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityToken {
    /// `ID` (SAML 2.0) or `AssertionID` (SAML 1.1).
    pub id: Option<String>,
    pub issuer: Option<String>,
    pub attribute_statements: Vec<AttributeStatement>,
}

impl SecurityToken {
    /// Flatten all attribute statements into a claims map.
    #[must_use]
    pub fn claims(&self) -> TokenClaims {
        let mut claims = TokenClaims::new();
        for attribute in self
            .attribute_statements
            .iter()
            .flat_map(|statement| &statement.attributes)
        {
            claims
                .entry(attribute.name.clone())
                .or_default()
                .extend(attribute.values.iter().cloned());
        }
        claims
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeStatement {
    pub attributes: Vec<SamlAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlAttribute {
    pub name: String,
    /// `AttributeNamespace` (SAML 1.1) or `NameFormat` (SAML 2.0).
    pub namespace: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Whether a transport may follow `3xx` responses on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    #[default]
    Follow,
    /// Return the `3xx` response as is, so its `Location` and cookies can be read.
    Manual,
}

/// A single outgoing exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub redirects: RedirectPolicy,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            redirects: RedirectPolicy::Follow,
        }
    }

    /// `POST` with an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![(
                "Content-Type".to_owned(),
                "application/x-www-form-urlencoded".to_owned(),
            )],
            body: Some(body.into()),
            redirects: RedirectPolicy::Follow,
        }
    }

    #[must_use]
    pub fn with_redirects(mut self, redirects: RedirectPolicy) -> Self {
        self.redirects = redirects;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers with the given name (case-insensitive), in received order.
    pub fn header_values<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}
