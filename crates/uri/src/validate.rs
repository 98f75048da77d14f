//! Syntactic validation of URI components.
//!
//! One pure predicate per component, per the grammars of
//! [RFC 3986 Section 3](https://datatracker.ietf.org/doc/html/rfc3986#section-3).
//! The `strict` switch selects between the full RFC character sets and a
//! lenient mode that only rejects characters which would change how the URI
//! splits (`?` inside a path, `#` inside a query).

use std::net::Ipv6Addr;

use once_cell::sync::Lazy;

use crate::parser::RawUri;

static DEFAULT: Lazy<Validator> = Lazy::new(Validator::default);

/// Stateless component validator.
///
/// The default validator is strict. Use [`Validator::lenient`] to accept
/// inputs that merely split unambiguously without meeting the full RFC
/// character sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    strict: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl Validator {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Shared strict validator.
    pub fn default_ref() -> &'static Validator {
        &DEFAULT
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// `scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`, case-insensitive.
    pub fn scheme(&self, scheme: &str) -> bool {
        let mut bytes = scheme.bytes();
        match bytes.next() {
            Some(b) if b.is_ascii_alphabetic() => {}
            _ => return false,
        }
        bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
    }

    /// IPv4 literal, bracketed IPv6 literal, or hostname.
    pub fn host(&self, host: &str) -> bool {
        is_ipv4_literal(host) || is_bracketed_ipv6(host) || self.hostname(host)
    }

    /// Hostname syntax: dot-separated labels of letters, digits and hyphens,
    /// no empty label, no leading or trailing hyphen per label.
    ///
    /// Non-ASCII alphanumerics are accepted so that internationalized names
    /// validate before IDNA conversion.
    pub fn hostname(&self, host: &str) -> bool {
        !host.is_empty()
            && host.split('.').all(|label| {
                !label.is_empty()
                    && label.chars().count() <= 63
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c == '-' || c.is_alphanumeric())
            })
    }

    /// Any `u16` is a legal port; the out-of-range cases fail at parse time.
    pub fn port(&self, _port: u16) -> bool {
        true
    }

    /// Strict: every character is a path character or part of a `%XX` triple.
    /// Lenient: only literal `?` and `#` are forbidden.
    pub fn path(&self, path: &str) -> bool {
        if self.strict {
            all_in_set(path, |b| is_pchar(b) || b == b'/')
        } else {
            !path.bytes().any(|b| matches!(b, b'?' | b'#'))
        }
    }

    /// Strict: the RFC query set plus `%XX`. Lenient: forbids `#` only.
    pub fn query(&self, query: &str) -> bool {
        if self.strict {
            all_in_set(query, |b| is_pchar(b) || matches!(b, b'/' | b'?'))
        } else {
            !query.bytes().any(|b| b == b'#')
        }
    }

    /// Strict: the RFC fragment set plus `%XX`. Lenient: accepts anything.
    pub fn fragment(&self, fragment: &str) -> bool {
        if self.strict {
            all_in_set(fragment, |b| is_pchar(b) || matches!(b, b'/' | b'?'))
        } else {
            true
        }
    }

    /// Composite check: scheme and host present and valid, and every present
    /// optional component individually valid.
    pub fn absolute_uri(&self, input: &str) -> bool {
        let Ok(raw) = RawUri::parse(input) else {
            return false;
        };
        let RawUri { scheme, host, port, path, query, fragment, .. } = raw;

        let scheme_ok = scheme.as_deref().is_some_and(|s| self.scheme(s));
        let host_ok = host.as_deref().is_some_and(|h| !h.is_empty() && self.host(h));

        scheme_ok
            && host_ok
            && port.is_none_or(|p| self.port(p))
            && self.path(&path)
            && query.as_deref().is_none_or(|q| self.query(q))
            && fragment.as_deref().is_none_or(|f| self.fragment(f))
    }
}

/// Dotted-decimal IPv4 literal: four octets, each `0..=255`.
pub(crate) fn is_ipv4_literal(host: &str) -> bool {
    let mut octets = 0;
    for part in host.split('.') {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        let Ok(value) = part.parse::<u16>() else {
            return false;
        };
        if value > 255 {
            return false;
        }
        octets += 1;
    }
    octets == 4
}

/// True when every `%` in `s` starts a well-formed `%XX` triple.
pub(crate) fn percent_triples_ok(s: &str) -> bool {
    all_in_set(s, |_| true)
}

pub(crate) fn is_bracketed_ipv6(host: &str) -> bool {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .is_some_and(|inner| inner.parse::<Ipv6Addr>().is_ok())
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn is_sub_delim(b: u8) -> bool {
    matches!(b, b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
}

/// `pchar = unreserved / pct-encoded / sub-delims / ":" / "@"`, with the
/// pct-encoded case handled by the `%XX` scan in [`all_in_set`].
fn is_pchar(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || matches!(b, b':' | b'@')
}

/// Scans `s`, accepting characters in `allowed` and well-formed `%XX` triples.
fn all_in_set(s: &str, allowed: impl Fn(u8) -> bool) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len()
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return false;
            }
            i += 3;
        } else if allowed(bytes[i]) {
            i += 1;
        } else {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_syntax() {
        let v = Validator::default();
        assert!(v.scheme("http"));
        assert!(v.scheme("HTTP"));
        assert!(v.scheme("coap+tcp"));
        assert!(v.scheme("z39.50r"));
        assert!(!v.scheme(""));
        assert!(!v.scheme("1http"));
        assert!(!v.scheme("ht tp"));
    }

    #[test]
    fn host_shapes() {
        let v = Validator::default();
        assert!(v.host("example.com"));
        assert!(v.host("127.0.0.1"));
        assert!(v.host("[::1]"));
        assert!(v.host("xn--bcher-kva.example"));
        assert!(v.host("bücher.example"));
        assert!(!v.host(""));
        assert!(!v.host("-leading.example"));
        assert!(!v.host("trailing-.example"));
        assert!(!v.host("double..dot"));
        assert!(!v.host("::1"));
        assert!(!v.host("exa_mple.com"));
    }

    #[test]
    fn ipv4_literal_shape() {
        assert!(is_ipv4_literal("0.0.0.0"));
        assert!(is_ipv4_literal("255.255.255.255"));
        assert!(!is_ipv4_literal("256.0.0.1"));
        assert!(!is_ipv4_literal("1.2.3"));
        assert!(!is_ipv4_literal("1.2.3.4.5"));
        assert!(!is_ipv4_literal("1.2.3.x"));
    }

    #[test]
    fn path_strict_vs_lenient() {
        let strict = Validator::default();
        let lenient = Validator::lenient();

        assert!(strict.path("/a/b%20c/d:e@f"));
        assert!(!strict.path("/a b"));
        assert!(!strict.path("/a%2"));
        assert!(!strict.path("/a%GG"));

        assert!(lenient.path("/a b{}"));
        assert!(!lenient.path("/a?b"));
        assert!(!lenient.path("/a#b"));
    }

    #[test]
    fn query_and_fragment_modes() {
        let strict = Validator::default();
        let lenient = Validator::lenient();

        assert!(strict.query("a=1&b=%C3%A9"));
        assert!(!strict.query("a=1 2"));
        assert!(lenient.query("a=1 2"));
        assert!(!lenient.query("a#b"));

        assert!(strict.fragment("sec-2"));
        assert!(!strict.fragment("a b"));
        assert!(lenient.fragment("a b#c"));
    }

    #[test]
    fn absolute_uri_composite() {
        let v = Validator::default();
        assert!(v.absolute_uri("https://example.com/a?b=1#c"));
        assert!(!v.absolute_uri("/relative/only"));
        assert!(!v.absolute_uri("https:///no-host"));
        assert!(!v.absolute_uri("https://example.com/bad path"));
    }
}
