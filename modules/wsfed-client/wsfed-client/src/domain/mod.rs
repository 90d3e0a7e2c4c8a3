//! Domain layer: endpoint resolution, cookie routing, form extraction,
//! result decoding and the handshake state machine.

pub mod claims;
pub mod cookies;
pub mod driver;
pub mod endpoints;
pub mod form;


pub use claims::{decode_fragment, decode_token};
pub use cookies::CookieJar;
pub use driver::{ConnectorHandshake, DirectAuthorizeHandshake, HandshakeBackends};
pub use endpoints::{ConnectorEndpoints, DirectAuthorizeEndpoints};
pub use form::FederationFormExtractor;
