//! RFC 3986 component canonicalization.
//!
//! Each function here is a pure transformation to the canonical form of one
//! URI component:
//!
//! - percent-encoding canonicalization (decode every `%XX` triple, re-encode
//!   everything that is not unreserved, uppercase hex digits),
//! - case folding for scheme and host,
//! - canonical dotted-decimal IPv4 and RFC 5952 compressed IPv6,
//! - optional IDNA-to-ASCII hostname conversion,
//! - default-port elision,
//! - dot-segment removal per [Section 5.2.4](https://datatracker.ietf.org/doc/html/rfc3986#section-5.2.4),
//! - query pair canonicalization with an optional stable sort.
//!
//! All functions are idempotent: normalizing an already-normalized component
//! returns it unchanged. [`Uri`](crate::Uri) relies on this to guarantee that
//! re-parsing its string form yields an equal value.

use std::net::Ipv6Addr;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};

use crate::error::UriError;
use crate::validate::{self, Validator};

/// Everything except unreserved characters (`A-Za-z0-9-._~`) gets encoded.
const NOT_UNRESERVED: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

static DEFAULT: Lazy<Normalizer> = Lazy::new(Normalizer::default);

/// Component normalizer.
///
/// `force_punycode` (default on) converts internationalized hostnames to
/// their ASCII form; `sort_query` (default off) orders query pairs
/// lexicographically by their full `key=value` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    force_punycode: bool,
    sort_query: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { force_punycode: true, sort_query: false }
    }
}

impl Normalizer {
    pub fn new(force_punycode: bool, sort_query: bool) -> Self {
        Self { force_punycode, sort_query }
    }

    /// Shared normalizer with the default configuration.
    pub fn default_ref() -> &'static Normalizer {
        &DEFAULT
    }

    /// Canonicalizes the percent-encoding of `s`.
    ///
    /// Existing `%XX` triples are decoded first, then every byte outside the
    /// unreserved set is re-encoded with uppercase hex digits. A stray `%`
    /// that does not start a valid triple is treated as a literal byte and
    /// comes back as `%25`.
    pub fn encode(&self, s: &str) -> String {
        let decoded: Vec<u8> = percent_decode_str(s).collect();
        percent_encode(&decoded, NOT_UNRESERVED).to_string()
    }

    /// Lowercases a scheme, rejecting anything outside the scheme grammar.
    pub fn scheme(&self, scheme: &str) -> Result<String, UriError> {
        if !Validator::default_ref().scheme(scheme) {
            return Err(UriError::InvalidScheme(scheme.to_string()));
        }
        Ok(scheme.to_ascii_lowercase())
    }

    /// Canonical dotted-decimal form: each octet without leading zeros.
    pub fn ipv4(&self, host: &str) -> Result<String, UriError> {
        let mut octets = Vec::with_capacity(4);
        for part in host.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(UriError::InvalidHost(host.to_string()));
            }
            let value: u32 =
                part.parse().map_err(|_| UriError::InvalidHost(host.to_string()))?;
            if value > 255 {
                return Err(UriError::InvalidHost(host.to_string()));
            }
            octets.push(value.to_string());
        }
        if octets.len() != 4 {
            return Err(UriError::InvalidHost(host.to_string()));
        }
        let result = octets.join(".");
        debug_assert!(validate::is_ipv4_literal(&result));
        Ok(result)
    }

    /// Bracketed canonical RFC 5952 form, via the standard library's
    /// `Ipv6Addr` display (lowercase hex, leading zeros stripped, the first
    /// longest all-zero run compressed to `::`).
    pub fn ipv6(&self, host: &str) -> Result<String, UriError> {
        let inner = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
        let addr: Ipv6Addr =
            inner.parse().map_err(|_| UriError::InvalidHost(host.to_string()))?;
        Ok(format!("[{addr}]"))
    }

    /// Validates a hostname, then either converts it to ASCII via IDNA
    /// (when `force_punycode` is set) or merely lowercases it.
    pub fn hostname(&self, host: &str) -> Result<String, UriError> {
        if !Validator::default_ref().hostname(host) {
            return Err(UriError::InvalidHost(host.to_string()));
        }
        if self.force_punycode {
            idna::domain_to_ascii(host).map_err(|e| {
                tracing::debug!(host, error = ?e, "idna to-ascii conversion failed");
                UriError::idna(host)
            })
        } else {
            Ok(host.to_lowercase())
        }
    }

    /// Dispatches on the literal shape of `host`: bracketed means IPv6,
    /// four dot-separated digit runs mean IPv4, a bare parseable IPv6
    /// address is bracketed, anything else is a hostname.
    pub fn host(&self, host: &str) -> Result<String, UriError> {
        if host.is_empty() {
            return Ok(String::new());
        }
        if host.starts_with('[') {
            return self.ipv6(host);
        }
        let dotted_digits = host.bytes().all(|b| b.is_ascii_digit() || b == b'.');
        if dotted_digits && host.split('.').count() == 4 {
            return self.ipv4(host);
        }
        if host.parse::<Ipv6Addr>().is_ok() {
            return self.ipv6(host);
        }
        self.hostname(host)
    }

    /// Percent-encoded `user[:password]`; an empty user yields `""`.
    pub fn user_info(&self, user: &str, password: Option<&str>) -> String {
        if user.is_empty() {
            return String::new();
        }
        match password {
            Some(password) => format!("{}:{}", self.encode(user), self.encode(password)),
            None => self.encode(user),
        }
    }

    /// Default-port elision: `None` whenever the port equals the scheme's
    /// registered default.
    pub fn port(&self, port: Option<u16>, scheme: &str) -> Option<u16> {
        port.filter(|p| Some(*p) != default_port(scheme))
    }

    /// Removes dot-segments per RFC 3986 Section 5.2.4, collapses repeated
    /// slashes, and percent-normalizes every retained segment.
    ///
    /// A single leading slash is preserved when the input was absolute (or
    /// `normalize_relative` is set); a single trailing slash is preserved
    /// when the input ended in `/`, `/.` or `/..`.
    ///
    /// A rootless relative path keeps its leading `..` segments (they are
    /// only resolvable against a base), and a relative path consisting of
    /// nothing but removable dot-segments comes back as `.`, never as the
    /// empty path: an empty reference means "same document", while `.`
    /// means "current directory".
    pub fn path(&self, path: &str, normalize_relative: bool) -> String {
        if path.is_empty() {
            return String::new();
        }
        let rooted = path.starts_with('/') || normalize_relative;
        let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");

        let mut segments: Vec<String> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if rooted || segments.last().is_some_and(|s| s != "..") {
                        segments.pop();
                    } else {
                        segments.push("..".to_string());
                    }
                }
                other => segments.push(self.encode(other)),
            }
        }

        let mut out = String::new();
        if rooted {
            out.push('/');
        }
        out.push_str(&segments.join("/"));
        if out.is_empty() {
            out.push('.');
        }
        if trailing && !out.ends_with('/') {
            out.push('/');
        }
        out
    }

    /// Canonicalizes a query string: splits on `&`, drops pairs with an
    /// empty key, percent-normalizes keys and values independently, and
    /// optionally stable-sorts pairs by their full string form.
    pub fn query(&self, query: &str) -> String {
        let mut pairs: Vec<String> = query
            .split('&')
            .filter_map(|pair| {
                if pair.is_empty() {
                    return None;
                }
                match pair.split_once('=') {
                    Some(("", _)) => None,
                    Some((key, value)) => {
                        Some(format!("{}={}", self.encode(key), self.encode(value)))
                    }
                    None => Some(self.encode(pair)),
                }
            })
            .collect();
        if self.sort_query {
            pairs.sort();
        }
        pairs.join("&")
    }

    /// Percent-normalizes a fragment.
    pub fn fragment(&self, fragment: &str) -> String {
        self.encode(fragment)
    }
}

/// Registered default port for well-known schemes.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        "ssh" | "sftp" => Some(22),
        "telnet" => Some(23),
        "smtp" => Some(25),
        "gopher" => Some(70),
        "pop" => Some(110),
        "nntp" => Some(119),
        "imap" => Some(143),
        "ldap" => Some(389),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Normalizer {
        Normalizer::default()
    }

    #[test]
    fn encode_decodes_unreserved_triples() {
        assert_eq!(n().encode("%7Efoo"), "~foo");
        assert_eq!(n().encode("%41%42%43"), "ABC");
    }

    #[test]
    fn encode_uppercases_hex_and_keeps_reserved_encoded() {
        assert_eq!(n().encode("a%3ab"), "a%3Ab");
        assert_eq!(n().encode("a b"), "a%20b");
        assert_eq!(n().encode("a/b"), "a%2Fb");
    }

    #[test]
    fn encode_is_idempotent() {
        for input in ["%7Efoo", "a b", "100%", "%zz", "héllo", "a%3Ab"] {
            let once = n().encode(input);
            assert_eq!(n().encode(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn encode_treats_stray_percent_as_literal() {
        assert_eq!(n().encode("100%"), "100%25");
        assert_eq!(n().encode("%2"), "%252");
    }

    #[test]
    fn scheme_lowercases_and_validates() {
        assert_eq!(n().scheme("HTTPS").unwrap(), "https");
        assert!(matches!(n().scheme("1bad").unwrap_err(), UriError::InvalidScheme(_)));
    }

    #[test]
    fn ipv4_strips_leading_zeros() {
        assert_eq!(n().ipv4("127.000.0.01").unwrap(), "127.0.0.1");
        assert!(n().ipv4("256.0.0.1").is_err());
        assert!(n().ipv4("1.2.3").is_err());
        assert!(n().ipv4("1.2.3.x").is_err());
    }

    #[test]
    fn ipv6_canonical_compression() {
        assert_eq!(
            n().ipv6("2001:0db8:0000:0000:0000:ff00:0042:8329").unwrap(),
            "[2001:db8::ff00:42:8329]"
        );
        assert_eq!(n().ipv6("::1").unwrap(), "[::1]");
        assert_eq!(n().ipv6("[0:0:0:0:0:0:0:0]").unwrap(), "[::]");
        // Runs of a single zero group are not compressed.
        assert_eq!(n().ipv6("2001:db8:0:1:1:1:1:1").unwrap(), "[2001:db8:0:1:1:1:1:1]");
        // The longest zero run is compressed, the first one on ties.
        assert_eq!(n().ipv6("2001:0:0:1:0:0:0:1").unwrap(), "[2001:0:0:1::1]");
        assert_eq!(n().ipv6("1:0:0:1:0:0:1:1").unwrap(), "[1::1:0:0:1:1]");
        assert!(n().ipv6("not:an:address").is_err());
    }

    #[test]
    fn hostname_punycode_and_lowercase() {
        assert_eq!(n().hostname("Example.COM").unwrap(), "example.com");
        assert_eq!(n().hostname("bücher.example").unwrap(), "xn--bcher-kva.example");
        assert_eq!(
            Normalizer::new(false, false).hostname("BÜCHER.example").unwrap(),
            "bücher.example"
        );
        assert!(n().hostname("bad..name").is_err());
    }

    #[test]
    fn host_dispatches_on_shape() {
        assert_eq!(n().host("").unwrap(), "");
        assert_eq!(n().host("[::1]").unwrap(), "[::1]");
        assert_eq!(n().host("::1").unwrap(), "[::1]");
        assert_eq!(n().host("010.0.0.1").unwrap(), "10.0.0.1");
        assert_eq!(n().host("Example.Com").unwrap(), "example.com");
        // Five digit runs is not an IPv4 shape, it validates as a hostname.
        assert_eq!(n().host("1.2.3.4.5").unwrap(), "1.2.3.4.5");
    }

    #[test]
    fn user_info_forms() {
        assert_eq!(n().user_info("", None), "");
        assert_eq!(n().user_info("", Some("secret")), "");
        assert_eq!(n().user_info("user", None), "user");
        assert_eq!(n().user_info("us er", Some("p@ss")), "us%20er:p%40ss");
    }

    #[test]
    fn default_port_elision() {
        assert_eq!(n().port(Some(80), "http"), None);
        assert_eq!(n().port(Some(443), "https"), None);
        assert_eq!(n().port(Some(8080), "http"), Some(8080));
        assert_eq!(n().port(Some(80), "https"), Some(80));
        assert_eq!(n().port(None, "http"), None);
    }

    #[test]
    fn dot_segment_removal() {
        assert_eq!(n().path("/a/./b/../c", false), "/a/c");
        assert_eq!(n().path("/a/b/../../c", false), "/c");
        assert_eq!(n().path("/a/b/../../../c", false), "/c");
        assert_eq!(n().path("/a//b///c", false), "/a/b/c");
        assert_eq!(n().path("/a/b/", false), "/a/b/");
        assert_eq!(n().path("/a/b/..", false), "/a/");
        assert_eq!(n().path("a/./b", false), "a/b");
        assert_eq!(n().path("a/./b", true), "/a/b");
        assert_eq!(n().path("", false), "");
        assert_eq!(n().path("/", false), "/");
    }

    #[test]
    fn relative_dot_segments_stay_meaningful() {
        // only a base can absorb these, so they survive normalization
        assert_eq!(n().path(".", false), ".");
        assert_eq!(n().path("..", false), "..");
        assert_eq!(n().path("../g", false), "../g");
        assert_eq!(n().path("../../g", false), "../../g");
        // interior dot-segments are still removable
        assert_eq!(n().path("a/../g", false), "g");
        assert_eq!(n().path("g/..", false), "./");
        assert_eq!(n().path("./g", false), "g");
        // rooted paths drop excess ".." as before
        assert_eq!(n().path("/..", false), "/");
        assert_eq!(n().path("..", true), "/");
    }

    #[test]
    fn path_segments_are_percent_normalized() {
        assert_eq!(n().path("/%7Efoo/./bar/baz/../qux", false), "/~foo/bar/qux");
        assert_eq!(n().path("/a b/c", false), "/a%20b/c");
    }

    #[test]
    fn query_canonicalization() {
        assert_eq!(n().query("b=2&a=1"), "b=2&a=1");
        assert_eq!(n().query("a=1&&b=2"), "a=1&b=2");
        assert_eq!(n().query("=5&a=1"), "a=1");
        assert_eq!(n().query("flag&a=1"), "flag&a=1");
        assert_eq!(n().query("a=x y"), "a=x%20y");

        let sorting = Normalizer::new(true, true);
        assert_eq!(sorting.query("b=2&a=1"), "a=1&b=2");
        assert_eq!(sorting.query("a=2&a=1"), "a=1&a=2");
    }

    #[test]
    fn known_default_ports() {
        assert_eq!(default_port("http"), Some(80));
        assert_eq!(default_port("wss"), Some(443));
        assert_eq!(default_port("ftp"), Some(21));
        assert_eq!(default_port("unknown"), None);
    }
}
