//! WS-Federation Client SDK
//!
//! This crate provides the public surface shared by the `wsfed_client` module
//! and any alternative backend implementation:
//!
//! - [`DirectAuthorizeConfig`] / [`ConnectorConfig`] - Handshake inputs
//! - [`FragmentClaims`] / [`TokenClaims`] - Handshake outputs
//! - [`HttpTransport`], [`CredentialProvider`], [`FormFieldQuery`], [`AssertionParser`] -
//!   Pluggable backends the handshake driver is built from
//! - [`HandshakeError`] - Stage-tagged error chain
//!
//! ## Usage
//!
//! Backends are injected as trait objects, so a test (or a platform with its
//! own credential negotiation) can swap any of them:
//!
//! ```ignore
//! use std::sync::Arc;
//! use wsfed_client_sdk::HttpTransport;
//!
//! let transport: Arc<dyn HttpTransport> = Arc::new(MyTransport::default());
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod error;
pub mod models;
pub mod plugin_api;

// Re-export main types at crate root
pub use error::{FormError, HandshakeError, HandshakeStage, TokenError, TransportError};
pub use models::{
    AttributeStatement, ConnectorConfig, Cookie, DirectAuthorizeConfig, FragmentClaims,
    HttpMethod, HttpRequest, HttpResponse, IdentityProvider, RedirectPolicy, RedirectResult,
    SamlAttribute, SecurityToken, TokenClaims, Wresult,
};
pub use plugin_api::{AssertionParser, CredentialProvider, FormFieldQuery, HttpTransport};
