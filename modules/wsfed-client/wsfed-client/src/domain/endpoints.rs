//! Endpoint resolution for both handshake variants.
//!
//! Pure string formatting: every value placed in a query parameter is
//! percent-encoded, values that land in a host or path segment are used as
//! given. Malformed settings produce malformed URLs, which the transport
//! rejects.

use urlencoding::encode;
use wsfed_client_sdk::{ConnectorConfig, DirectAuthorizeConfig, IdentityProvider};

/// URLs used by the direct-authorize handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectAuthorizeEndpoints {
    pub authorize: String,
    pub login_callback: String,
}

impl DirectAuthorizeEndpoints {
    #[must_use]
    pub fn resolve(config: &DirectAuthorizeConfig) -> Self {
        let idp = &config.identity_provider;
        let authorize = format!(
            "https://{domain}/authorize?scope={scope}&response_type=token&connection={connection}\
             &sso=true&state=&client_id={client_id}&redirect_uri={callback}",
            domain = idp.domain,
            scope = encode(&config.scope),
            connection = encode(&idp.connection),
            client_id = encode(&idp.client_id),
            callback = encode(&config.callback_url),
        );

        Self {
            authorize,
            login_callback: login_callback(idp),
        }
    }
}

/// URLs used by the connector handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorEndpoints {
    /// Identity provider WS-Federation endpoint, seeds the first cookie.
    pub wsfed: String,
    pub authorize: String,
    /// Connector WS-Federation sign-in endpoint.
    pub connector_wsfed: String,
    pub login_callback: String,
}

impl ConnectorEndpoints {
    #[must_use]
    pub fn resolve(config: &ConnectorConfig) -> Self {
        let idp = &config.identity_provider;
        let authorize = format!(
            "https://{domain}/authorize?response_type=code&connection={connection}\
             &sso=true&state=&client_id={client_id}&protocol=wsfed",
            domain = idp.domain,
            connection = encode(&idp.connection),
            client_id = encode(&idp.client_id),
        );
        let connector_wsfed = format!(
            "{base}/wsfed?state=none&wtrealm={realm}&wa=wsignin1.0&wreply={reply}",
            base = config.connector_url.trim_end_matches('/'),
            realm = encode(&format!("urn:auth0:{}", config.tenant)),
            reply = encode(&login_callback(idp)),
        );

        Self {
            wsfed: format!("https://{}/wsfed/{}", idp.domain, idp.client_id),
            authorize,
            connector_wsfed,
            login_callback: login_callback(idp),
        }
    }
}

fn login_callback(idp: &IdentityProvider) -> String {
    format!("https://{}/login/callback", idp.domain)
}
