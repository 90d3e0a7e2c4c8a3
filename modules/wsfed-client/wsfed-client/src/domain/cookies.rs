//! Cookie jar scoped to the identity provider domain.

use tracing::{debug, warn};
use url::Url;
use wsfed_client_sdk::{Cookie, HttpRequest, HttpResponse};

/// Ordered set of cookies collected over one handshake run.
///
/// Only the name/value pair of each `Set-Cookie` is kept; attributes are
/// dropped. A later cookie with the same name replaces the earlier one in
/// place, and an empty value removes it.
///
/// The jar is scoped to the identity provider authority (host and port),
/// the same `domain` the endpoint templates put behind `https://`.
#[derive(Debug, Clone)]
pub struct CookieJar {
    origin: Option<(String, u16)>,
    cookies: Vec<Cookie>,
}

impl CookieJar {
    #[must_use]
    pub fn new(domain: &str) -> Self {
        let origin = Url::parse(&format!("https://{domain}"))
            .ok()
            .and_then(|url| Some((url.host_str()?.to_owned(), url.port_or_known_default()?)));
        if origin.is_none() {
            warn!("identity provider domain is not a valid authority; cookies will not be sent");
        }
        Self {
            origin,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Store every cookie set by `response`.
    pub fn absorb(&mut self, response: &HttpResponse) {
        self.extend(response_cookies(response));
    }

    /// Store the cookies of `response` if it came from the identity provider.
    pub fn absorb_from(&mut self, url: &str, response: &HttpResponse) {
        if self.covers(url) {
            self.absorb(response);
        }
    }

    pub fn insert(&mut self, cookie: Cookie) {
        let existing = self.cookies.iter().position(|c| c.name == cookie.name);
        match (existing, cookie.value.is_empty()) {
            (Some(index), true) => {
                self.cookies.remove(index);
            }
            (Some(index), false) => self.cookies[index] = cookie,
            (None, true) => {}
            (None, false) => self.cookies.push(cookie),
        }
    }

    /// `Cookie` header value, `None` when the jar is empty.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        Some(pairs.join("; "))
    }

    /// Attach the jar to `request` if it targets the identity provider host.
    #[must_use]
    pub fn attach(&self, request: HttpRequest) -> HttpRequest {
        if !self.covers(&request.url) {
            debug!(url = %request.url, "request is outside the cookie domain");
            return request;
        }
        match self.header_value() {
            Some(value) => request.with_header("Cookie", value),
            None => request,
        }
    }

    /// Whether `url` targets the identity provider host and port.
    #[must_use]
    pub fn covers(&self, url: &str) -> bool {
        let Some((host, port)) = &self.origin else {
            return false;
        };
        Url::parse(url).is_ok_and(|url| {
            url.host_str().is_some_and(|h| h.eq_ignore_ascii_case(host))
                && url.port_or_known_default() == Some(*port)
        })
    }
}

impl Extend<Cookie> for CookieJar {
    fn extend<I: IntoIterator<Item = Cookie>>(&mut self, iter: I) {
        for cookie in iter {
            self.insert(cookie);
        }
    }
}

/// Cookies set by `response`, in header order.
#[must_use]
pub fn response_cookies(response: &HttpResponse) -> Vec<Cookie> {
    response
        .header_values("set-cookie")
        .filter_map(|header| {
            let cookie = parse_set_cookie(header);
            if cookie.is_none() {
                warn!("ignoring unparseable Set-Cookie header");
            }
            cookie
        })
        .collect()
}

fn parse_set_cookie(header: &str) -> Option<Cookie> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Cookie::new(name, value.trim().trim_matches('"')))
}
