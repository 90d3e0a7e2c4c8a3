//! WS-Federation Client
//!
//! Client side of the WS-Federation passive requestor handshake against an
//! identity provider that delegates authentication to a connector. The
//! connector authenticates the caller with ambient network credentials and
//! answers with a signed `wresult`, which is posted back to the identity
//! provider's login callback.
//!
//! Two flows are provided:
//!
//! - [`DirectAuthorizeHandshake::authenticate`] - follows the authorize
//!   redirect to the connector and returns the claims carried in the
//!   callback `Location` fragment.
//! - [`ConnectorHandshake::token_claims`] - talks to the connector's own
//!   WS-Federation endpoint and returns the attributes of the SAML assertion
//!   issued by the identity provider.
//!
//! ## Configuration
//!
//! ```yaml
//! domain: "tenant.auth0.com"
//! client_id: "abc123"
//! connection_name: "corp-ad"
//! connector_url: "https://connector.corp.local:8443"
//! tenant_name: "tenant"
//! timeout: "30s"
//! credentials:
//!   mode: ambient
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, CredentialsConfig, WsFedClientConfig};
pub use domain::{ConnectorHandshake, DirectAuthorizeHandshake, HandshakeBackends};
