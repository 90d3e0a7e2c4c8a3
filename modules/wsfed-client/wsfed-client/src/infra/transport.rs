//! Blocking HTTP transport on top of `ureq`.

use std::time::Duration;

use tracing::trace;
use wsfed_client_sdk::{HttpRequest, HttpResponse, HttpTransport, RedirectPolicy, TransportError};

/// Redirect hops allowed when a request follows redirects.
const MAX_REDIRECTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Overall timeout per request; `None` keeps the transport default.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("wsfed-client/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// `ureq` transport with one agent per redirect policy.
///
/// No cookie store is enabled: cookies are routed by the handshake driver.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    following: ureq::Agent,
    manual: ureq::Agent,
}

impl UreqTransport {
    #[must_use]
    pub fn new(options: &TransportOptions) -> Self {
        Self {
            following: agent(options, MAX_REDIRECTS),
            manual: agent(options, 0),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportOptions::default())
    }
}

fn agent(options: &TransportOptions, redirects: u32) -> ureq::Agent {
    // Connector credentials must survive its own same-host redirects.
    let mut builder = ureq::AgentBuilder::new()
        .redirects(redirects)
        .redirect_auth_headers(ureq::RedirectAuthHeaders::SameHost)
        .user_agent(&options.user_agent);
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

impl HttpTransport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method.as_str();
        let agent = match request.redirects {
            RedirectPolicy::Follow => &self.following,
            RedirectPolicy::Manual => &self.manual,
        };

        let mut call = agent.request(method, &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let outcome = match &request.body {
            Some(body) => call.send_string(body),
            None => call.call(),
        };
        let response = match outcome {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(e)) => {
                return Err(TransportError::Io {
                    method,
                    url: request.url,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        let mut headers = Vec::new();
        for name in response.headers_names() {
            for value in response.all(&name) {
                headers.push((name.clone(), value.to_owned()));
            }
        }
        let body = response.into_string().map_err(|e| TransportError::Io {
            method,
            url: request.url.clone(),
            message: format!("unable to read response body: {e}"),
        })?;

        trace!(method, url = %request.url, status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
