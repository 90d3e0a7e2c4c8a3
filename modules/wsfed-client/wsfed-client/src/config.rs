//! Configuration for the WS-Federation client.
//!
//! Loaded from an optional YAML file, then overridden by `WSFED_`-prefixed
//! environment variables. Nested keys are split on `__`, so
//! `WSFED_CREDENTIALS__MODE=basic` sets `credentials.mode`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use wsfed_client_sdk::{ConnectorConfig, CredentialProvider, DirectAuthorizeConfig, IdentityProvider};

use crate::domain::HandshakeBackends;
use crate::infra::{
    AmbientCredentials, BasicCredentials, HeaderCredentials, TransportOptions, UreqTransport,
};

/// Prefix of the environment variables read by [`WsFedClientConfig::load`].
pub const ENV_PREFIX: &str = "WSFED_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} does not exist", path.display())]
    FileNotFound { path: PathBuf },

    #[error("unable to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    #[error("'{key}' must be set")]
    Missing { key: &'static str },

    #[error("invalid timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },
}

/// Client configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WsFedClientConfig {
    /// Identity provider host, e.g. `tenant.auth0.com`.
    pub domain: String,

    pub client_id: String,

    /// Enterprise connection served by the connector.
    pub connection_name: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    /// Connector base URL. Required by the connector flow only.
    #[serde(default)]
    pub connector_url: Option<String>,

    /// Identity provider tenant. Required by the connector flow only.
    #[serde(default)]
    pub tenant_name: Option<String>,

    /// Per-request timeout, e.g. `30s` or `1m 30s`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// How the connector request is authenticated.
#[derive(Debug, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CredentialsConfig {
    /// Rely on the platform's integrated authentication.
    #[default]
    Ambient,
    Basic {
        username: String,
        password: SecretString,
    },
    /// Send a pre-negotiated `Authorization` header value.
    Header { value: SecretString },
}

fn default_scope() -> String {
    DirectAuthorizeConfig::DEFAULT_SCOPE.to_owned()
}

fn default_callback_url() -> String {
    DirectAuthorizeConfig::DEFAULT_CALLBACK_URL.to_owned()
}

impl WsFedClientConfig {
    /// Load the configuration from `path` (if any) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] for a missing file,
    /// [`ConfigError::Load`] when the sources do not form a valid
    /// configuration and [`ConfigError::Missing`] for empty required keys.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("domain", &self.domain),
            ("client_id", &self.client_id),
            ("connection_name", &self.connection_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { key });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn identity_provider(&self) -> IdentityProvider {
        IdentityProvider::new(&self.domain, &self.client_id, &self.connection_name)
    }

    #[must_use]
    pub fn direct_authorize(&self) -> DirectAuthorizeConfig {
        DirectAuthorizeConfig {
            identity_provider: self.identity_provider(),
            callback_url: self.callback_url.clone(),
            scope: self.scope.clone(),
        }
    }

    /// Settings of the connector flow.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `connector_url` or `tenant_name`
    /// is absent or empty.
    pub fn connector(&self) -> Result<ConnectorConfig, ConfigError> {
        Ok(ConnectorConfig {
            identity_provider: self.identity_provider(),
            connector_url: required("connector_url", self.connector_url.as_deref())?,
            tenant: required("tenant_name", self.tenant_name.as_deref())?,
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] when `timeout` is not a
    /// human-readable duration.
    pub fn transport_options(&self) -> Result<TransportOptions, ConfigError> {
        let mut options = TransportOptions::default();
        if let Some(timeout) = &self.timeout {
            options.timeout = Some(parse_timeout(timeout)?);
        }
        if let Some(user_agent) = &self.user_agent {
            options.user_agent.clone_from(user_agent);
        }
        Ok(options)
    }

    #[must_use]
    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        match &self.credentials {
            CredentialsConfig::Ambient => Arc::new(AmbientCredentials),
            CredentialsConfig::Basic { username, password } => Arc::new(BasicCredentials::new(
                username,
                SecretString::from(password.expose_secret().to_owned()),
            )),
            CredentialsConfig::Header { value } => Arc::new(HeaderCredentials::new(
                SecretString::from(value.expose_secret().to_owned()),
            )),
        }
    }

    /// Default backends: a `ureq` transport and the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] for an unparseable timeout.
    pub fn backends(&self) -> Result<HandshakeBackends, ConfigError> {
        let transport = UreqTransport::new(&self.transport_options()?);
        Ok(HandshakeBackends::new(Arc::new(transport)).with_credentials(self.credential_provider()))
    }
}

fn required(key: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::Missing { key })
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let timeout = humantime::parse_duration(value).map_err(|e| ConfigError::InvalidTimeout {
        value: value.to_owned(),
        reason: e.to_string(),
    })?;
    if timeout.is_zero() {
        return Err(ConfigError::InvalidTimeout {
            value: value.to_owned(),
            reason: "timeout must be greater than zero".to_owned(),
        });
    }
    Ok(timeout)
}
