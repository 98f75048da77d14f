//! Outgoing-request representation.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use tidy_uri::Uri;

use crate::error::ParseError;
use crate::header::{HeaderMap, is_tchar};
use crate::message::{Message, Parts};

/// Request method: a case-sensitive token per
/// [RFC 9110 Section 9.1](https://datatracker.ietf.org/doc/html/rfc9110#section-9.1).
///
/// Any token is a legal method (`PROPFIND`, `PURGE`, ...); the standard
/// verbs are provided as constants. `GET` and `get` are distinct methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method(Cow<'static, str>);

impl Method {
    pub const GET: Method = Method(Cow::Borrowed("GET"));
    pub const HEAD: Method = Method(Cow::Borrowed("HEAD"));
    pub const POST: Method = Method(Cow::Borrowed("POST"));
    pub const PUT: Method = Method(Cow::Borrowed("PUT"));
    pub const DELETE: Method = Method(Cow::Borrowed("DELETE"));
    pub const CONNECT: Method = Method(Cow::Borrowed("CONNECT"));
    pub const OPTIONS: Method = Method(Cow::Borrowed("OPTIONS"));
    pub const TRACE: Method = Method(Cow::Borrowed("TRACE"));
    pub const PATCH: Method = Method(Cow::Borrowed("PATCH"));

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts any non-empty token; anything outside the token grammar fails.
impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(is_tchar) {
            return Err(ParseError::Method(s.to_string()));
        }
        Ok(Method(Cow::Owned(s.to_string())))
    }
}

/// Immutable request: method, target URI and the shared message parts.
///
/// Construction and [`Request::with_uri`] keep the `Host` header in sync
/// with the URI's authority, following the PSR-7 preserve-host rules.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    /// Explicit request-target override; origin form is derived otherwise.
    target: Option<String>,
    parts: Parts,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        let mut request =
            Self { method, uri, target: None, parts: Parts::default() };
        request.sync_host_header();
        request
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn with_method(&self, method: Method) -> Self {
        let mut next = self.clone();
        next.method = method;
        next
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Swaps the target URI. The `Host` header is updated from the new
    /// URI's host unless `preserve_host` is set and a `Host` header already
    /// exists; a URI without a host never clears the header.
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut next = self.clone();
        next.uri = uri;
        let keep = preserve_host && next.parts.headers.contains("host");
        if !keep {
            next.sync_host_header();
        }
        next
    }

    /// The request target in origin form (`/path?query`), or the explicit
    /// override when one was set.
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.target {
            return target.clone();
        }
        let path = self.uri.path();
        let mut target = if path.is_empty() { "/".to_string() } else { path.to_string() };
        if let Some(query) = self.uri.query() {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    pub fn with_request_target(&self, target: &str) -> Self {
        let mut next = self.clone();
        next.target = Some(target.to_string());
        next
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    fn sync_host_header(&mut self) {
        let host = self.uri.host();
        if host.is_empty() {
            return;
        }
        let value = match self.uri.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        // a normalized host is always a valid header value
        self.parts
            .headers
            .set("Host", vec![value])
            .expect("normalized host is a valid header value");
    }
}

impl Message for Request {
    fn parts(&self) -> &Parts {
        &self.parts
    }

    fn with_parts(&self, parts: Parts) -> Self {
        let mut next = self.clone();
        next.parts = parts;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn construction_sets_the_host_header() {
        let request = Request::new(Method::GET, uri("https://example.com/a"));
        assert_eq!(request.header_line("Host").unwrap(), "example.com");

        let request = Request::new(Method::GET, uri("http://example.com:8080/"));
        assert_eq!(request.header_line("host").unwrap(), "example.com:8080");
    }

    #[test]
    fn default_port_is_left_out_of_host() {
        let request = Request::new(Method::GET, uri("https://example.com:443/"));
        assert_eq!(request.header_line("Host").unwrap(), "example.com");
    }

    #[test]
    fn with_uri_updates_host_by_default() {
        let request = Request::new(Method::GET, uri("https://one.test/"));
        let moved = request.with_uri(uri("https://two.test/"), false);

        assert_eq!(moved.header_line("Host").unwrap(), "two.test");
        assert_eq!(request.header_line("Host").unwrap(), "one.test");
    }

    #[test]
    fn preserve_host_keeps_the_existing_header() {
        let request = Request::new(Method::GET, uri("https://one.test/"));
        let moved = request.with_uri(uri("https://two.test/"), true);
        assert_eq!(moved.header_line("Host").unwrap(), "one.test");
    }

    #[test]
    fn preserve_host_without_existing_header_still_sets_it() {
        let request =
            Request::new(Method::GET, uri("https://one.test/")).without_header("host");
        let moved = request.with_uri(uri("https://two.test/"), true);
        assert_eq!(moved.header_line("Host").unwrap(), "two.test");
    }

    #[test]
    fn hostless_uri_never_clears_host() {
        let request = Request::new(Method::GET, uri("https://one.test/"));
        let moved = request.with_uri(uri("mailto:user@example.com"), false);
        assert_eq!(moved.header_line("Host").unwrap(), "one.test");
    }

    #[test]
    fn request_target_origin_form() {
        let request = Request::new(Method::GET, uri("https://example.com/a/b?x=1"));
        assert_eq!(request.request_target(), "/a/b?x=1");

        let request = Request::new(Method::GET, uri("https://example.com"));
        assert_eq!(request.request_target(), "/");

        let overridden = request.with_request_target("*");
        assert_eq!(overridden.request_target(), "*");
        assert_eq!(request.request_target(), "/");
    }

    #[test]
    fn any_token_parses_as_a_method() {
        assert_eq!("PATCH".parse::<Method>().unwrap(), Method::PATCH);

        let purge: Method = "PURGE".parse().unwrap();
        assert_eq!(purge.as_str(), "PURGE");

        // case-sensitive: a lowercase spelling is a different method
        assert_ne!("get".parse::<Method>().unwrap(), Method::GET);

        assert!(matches!("".parse::<Method>(), Err(ParseError::Method(_))));
        assert!(matches!("GE T".parse::<Method>(), Err(ParseError::Method(_))));
        assert!(matches!("GET/1".parse::<Method>(), Err(ParseError::Method(_))));
    }

    #[test]
    fn message_mutators_keep_request_fields() {
        let request = Request::new(Method::POST, uri("https://example.com/submit"));
        let derived = request.with_version(Version::Http2).with_header("X", "1").unwrap();

        assert_eq!(derived.method(), &Method::POST);
        assert_eq!(derived.uri().to_string(), "https://example.com/submit");
        assert_eq!(derived.version(), Version::Http2);
        assert_eq!(request.version(), Version::Http11);
    }
}
