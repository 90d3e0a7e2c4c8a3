//! Handshake driver: the ordered request sequence of both variants.
//!
//! Every step waits for its round trip, and each step's output (a cookie,
//! a location, a `wresult`) is the next step's input. The first failure
//! aborts the run; nothing is retried and no partial result is returned.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};
use url::Url;
use wsfed_client_sdk::{
    AssertionParser, ConnectorConfig, CredentialProvider, DirectAuthorizeConfig, FormFieldQuery,
    FragmentClaims, HandshakeError, HandshakeStage, HttpRequest, HttpResponse, HttpTransport,
    RedirectPolicy, RedirectResult, TokenClaims, TransportError, Wresult,
};

use super::claims::{decode_fragment, decode_token};
use super::cookies::{CookieJar, response_cookies};
use super::endpoints::{ConnectorEndpoints, DirectAuthorizeEndpoints};
use super::form::FederationFormExtractor;
use crate::infra::{AmbientCredentials, SamlAssertionParser, TlFormQuery};

/// Redirect hops walked by [`follow_redirects`].
pub const MAX_REDIRECT_HOPS: u32 = 10;

/// The pluggable backends a handshake is built from.
#[derive(Clone)]
pub struct HandshakeBackends {
    pub transport: Arc<dyn HttpTransport>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub forms: Arc<dyn FormFieldQuery>,
    pub assertions: Arc<dyn AssertionParser>,
}

impl HandshakeBackends {
    /// Backends around `transport` with ambient credentials and the default parsers.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            credentials: Arc::new(AmbientCredentials),
            forms: Arc::new(TlFormQuery),
            assertions: Arc::new(SamlAssertionParser),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_forms(mut self, forms: Arc<dyn FormFieldQuery>) -> Self {
        self.forms = forms;
        self
    }

    #[must_use]
    pub fn with_assertions(mut self, assertions: Arc<dyn AssertionParser>) -> Self {
        self.assertions = assertions;
        self
    }

    /// Fetch the connector page with ambient credentials and no cookies.
    fn query_connector(&self, url: String) -> Result<String, TransportError> {
        let mut request = HttpRequest::get(url);
        self.credentials.apply(&mut request)?;
        exchange(self.transport.as_ref(), request).map(|response| response.body)
    }
}

/// Variant A: authorize redirect to the connector, token returned in the
/// callback `Location` fragment.
///
/// Holds no per-call state, so one instance may serve concurrent callers.
pub struct DirectAuthorizeHandshake {
    config: DirectAuthorizeConfig,
    endpoints: DirectAuthorizeEndpoints,
    extractor: FederationFormExtractor,
    backends: HandshakeBackends,
}

impl DirectAuthorizeHandshake {
    #[must_use]
    pub fn new(config: DirectAuthorizeConfig, backends: HandshakeBackends) -> Self {
        Self {
            endpoints: DirectAuthorizeEndpoints::resolve(&config),
            extractor: FederationFormExtractor::new(Arc::clone(&backends.forms)),
            config,
            backends,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &DirectAuthorizeEndpoints {
        &self.endpoints
    }

    /// Run the handshake and return the claims of the callback fragment.
    ///
    /// # Errors
    ///
    /// Returns the [`HandshakeError`] of the first failing stage:
    /// `AuthorizeFailed`, `ConnectorUnreachable`, `WresultNotFound`,
    /// `CallbackFailed` or `MalformedCallbackResponse`.
    #[instrument(
        skip_all,
        fields(
            domain = %self.config.identity_provider.domain,
            client_id = %self.config.identity_provider.client_id
        )
    )]
    pub fn authenticate(&self) -> Result<FragmentClaims, HandshakeError> {
        let result = self.run();
        report(result.as_ref().map(FragmentClaims::len));
        result
    }

    fn run(&self) -> Result<FragmentClaims, HandshakeError> {
        let transport = self.backends.transport.as_ref();
        let mut jar = CookieJar::new(&self.config.identity_provider.domain);

        debug!(stage = %HandshakeStage::AuthorizeRequested, "requesting authorize redirect");
        let authorize = request_redirect(transport, HttpRequest::get(&self.endpoints.authorize))
            .map_err(HandshakeError::AuthorizeFailed)?;
        let connector_url = resolve_location(&self.endpoints.authorize, &authorize.location)
            .map_err(HandshakeError::AuthorizeFailed)?;
        jar.extend(authorize.cookies);

        debug!(stage = %HandshakeStage::ConnectorQueried, cookies = jar.cookies().len(), "querying connector");
        let html = self
            .backends
            .query_connector(connector_url)
            .map_err(HandshakeError::ConnectorUnreachable)?;

        let wresult = extract(&self.extractor, &html, HandshakeStage::FormExtracted)?;

        debug!(stage = %HandshakeStage::CallbackPosted, "posting wresult to login callback");
        let request = jar.attach(
            sign_in_request(&self.endpoints.login_callback, &wresult)
                .with_redirects(RedirectPolicy::Manual),
        );
        let callback =
            request_redirect(transport, request).map_err(HandshakeError::CallbackFailed)?;

        debug!(stage = %HandshakeStage::ResultDecoded, "decoding callback fragment");
        decode_fragment(&callback.location)
    }
}

/// Variant B: WS-Federation against the connector, SAML token returned in
/// the identity provider's own auto-post form.
///
/// Holds no per-call state, so one instance may serve concurrent callers.
pub struct ConnectorHandshake {
    config: ConnectorConfig,
    endpoints: ConnectorEndpoints,
    extractor: FederationFormExtractor,
    backends: HandshakeBackends,
}

impl ConnectorHandshake {
    #[must_use]
    pub fn new(config: ConnectorConfig, backends: HandshakeBackends) -> Self {
        Self {
            endpoints: ConnectorEndpoints::resolve(&config),
            extractor: FederationFormExtractor::new(Arc::clone(&backends.forms)),
            config,
            backends,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &ConnectorEndpoints {
        &self.endpoints
    }

    /// Run the handshake and return the attribute claims of the SAML token.
    ///
    /// # Errors
    ///
    /// Returns the [`HandshakeError`] of the first failing stage:
    /// `CookieAcquisitionFailed`, `ConnectorAuthFailed`, `WresultNotFound`,
    /// `CallbackFailed`, `AssertionNotFound` or `TokenParseError`.
    #[instrument(
        skip_all,
        fields(
            domain = %self.config.identity_provider.domain,
            client_id = %self.config.identity_provider.client_id,
            tenant = %self.config.tenant
        )
    )]
    pub fn token_claims(&self) -> Result<TokenClaims, HandshakeError> {
        let result = self.run();
        report(result.as_ref().map(TokenClaims::len));
        result
    }

    fn run(&self) -> Result<TokenClaims, HandshakeError> {
        let transport = self.backends.transport.as_ref();
        let mut jar = CookieJar::new(&self.config.identity_provider.domain);

        debug!(stage = %HandshakeStage::CookiesSeeded, "seeding identity provider cookies");
        self.seed_cookies(&mut jar)
            .map_err(HandshakeError::CookieAcquisitionFailed)?;

        debug!(stage = %HandshakeStage::ConnectorQueried, cookies = jar.cookies().len(), "querying connector");
        let html = self
            .backends
            .query_connector(self.endpoints.connector_wsfed.clone())
            .map_err(HandshakeError::ConnectorAuthFailed)?;

        let wresult = extract(&self.extractor, &html, HandshakeStage::FormExtracted)?;

        // The identity provider resumes the session through its own redirect
        // chain; every hop needs the seeded cookies.
        debug!(stage = %HandshakeStage::CallbackPosted, "posting wresult to login callback");
        let request = sign_in_request(&self.endpoints.login_callback, &wresult);
        let response = follow_redirects(transport, &mut jar, request)
            .map_err(HandshakeError::CallbackFailed)?;

        let token = extract(
            &self.extractor,
            &response.body,
            HandshakeStage::ResponseFormExtracted,
        )?;

        debug!(stage = %HandshakeStage::ResultDecoded, "parsing security token");
        decode_token(self.backends.assertions.as_ref(), &token)
    }

    fn seed_cookies(&self, jar: &mut CookieJar) -> Result<(), TransportError> {
        let transport = self.backends.transport.as_ref();

        let seed = exchange(
            transport,
            HttpRequest::get(&self.endpoints.wsfed).with_redirects(RedirectPolicy::Manual),
        )?;
        jar.absorb(&seed);

        let authorize = exchange(
            transport,
            jar.attach(
                HttpRequest::get(&self.endpoints.authorize).with_redirects(RedirectPolicy::Manual),
            ),
        )?;
        jar.absorb(&authorize);
        Ok(())
    }
}

/// Execute `request` and enforce the status policy of its redirect mode.
///
/// Redirect-disabled requests accept `2xx` and `3xx`; redirect-following
/// ones accept `2xx` only.
///
/// # Errors
///
/// Returns the transport's error, or [`TransportError::Status`] for a
/// status outside the accepted range.
pub fn exchange(
    transport: &dyn HttpTransport,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let method = request.method.as_str();
    let url = request.url.clone();
    let redirects = request.redirects;

    let response = transport.execute(request)?;
    let accepted = match redirects {
        RedirectPolicy::Follow => response.is_success(),
        RedirectPolicy::Manual => response.is_success() || response.is_redirect(),
    };
    if !accepted {
        return Err(TransportError::Status {
            method,
            url,
            status: response.status,
        });
    }
    debug!(method, status = response.status, "exchange completed");
    Ok(response)
}

/// Execute `request` with redirects disabled and capture `Location` and cookies.
///
/// # Errors
///
/// Returns [`exchange`]'s errors, or [`TransportError::MissingLocation`].
pub fn request_redirect(
    transport: &dyn HttpTransport,
    request: HttpRequest,
) -> Result<RedirectResult, TransportError> {
    let url = request.url.clone();
    let response = exchange(transport, request.with_redirects(RedirectPolicy::Manual))?;
    let location = response
        .header("location")
        .ok_or(TransportError::MissingLocation { url })?
        .to_owned();

    Ok(RedirectResult {
        location,
        cookies: response_cookies(&response),
    })
}

/// Execute `request` and walk its redirect chain hop by hop.
///
/// Every hop is sent with redirects disabled, so cookies set along the chain
/// land in `jar` and the jar is attached to the next hop. `301`, `302` and
/// `303` continue with a body-less `GET`; `307` and `308` replay the method
/// and body.
///
/// # Errors
///
/// Returns [`exchange`]'s errors for any hop, [`TransportError::MissingLocation`]
/// for a redirect without a target and [`TransportError::TooManyRedirects`]
/// when the chain does not settle within [`MAX_REDIRECT_HOPS`].
pub fn follow_redirects(
    transport: &dyn HttpTransport,
    jar: &mut CookieJar,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let origin = request.url.clone();
    let mut request = jar.attach(request.with_redirects(RedirectPolicy::Manual));

    for _ in 0..=MAX_REDIRECT_HOPS {
        let url = request.url.clone();
        let mut replay = request.clone();
        let response = exchange(transport, request)?;
        jar.absorb_from(&url, &response);
        if !response.is_redirect() {
            return Ok(response);
        }

        let location = response
            .header("location")
            .ok_or_else(|| TransportError::MissingLocation { url: url.clone() })?;
        let target = resolve_location(&url, location)?;
        debug!(status = response.status, "following redirect");

        let next = if matches!(response.status, 307 | 308) {
            replay
                .headers
                .retain(|(name, _)| !name.eq_ignore_ascii_case("cookie"));
            HttpRequest {
                url: target,
                ..replay
            }
        } else {
            HttpRequest::get(target).with_redirects(RedirectPolicy::Manual)
        };
        request = jar.attach(next);
    }

    Err(TransportError::TooManyRedirects {
        url: origin,
        limit: MAX_REDIRECT_HOPS,
    })
}

fn resolve_location(base: &str, location: &str) -> Result<String, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: location.to_owned(),
        reason,
    };
    let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}

fn sign_in_request(login_callback: &str, wresult: &Wresult) -> HttpRequest {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("wa", "wsignin1.0")
        .append_pair("wctx", "undefined")
        .append_pair("wresult", wresult.expose())
        .finish();
    HttpRequest::post_form(login_callback, body)
}

fn extract(
    extractor: &FederationFormExtractor,
    html: &str,
    stage: HandshakeStage,
) -> Result<Wresult, HandshakeError> {
    debug!(%stage, bytes = html.len(), "extracting wresult");
    extractor
        .extract(html)
        .map_err(|source| HandshakeError::WresultNotFound { stage, source })
}

fn report(outcome: Result<usize, &HandshakeError>) {
    match outcome {
        Ok(claims) => info!(claims, "handshake completed"),
        Err(e) => error!(stage = %e.stage(), error = %e, "handshake failed"),
    }
}
