//! Default backends: `ureq` transport, `tl` form query, `quick-xml` SAML
//! parser and the credential providers.

pub mod credentials;
pub mod html;
pub mod saml;
pub mod transport;

pub use credentials::{AmbientCredentials, BasicCredentials, HeaderCredentials};
pub use html::TlFormQuery;
pub use saml::SamlAssertionParser;
pub use transport::{TransportOptions, UreqTransport};
