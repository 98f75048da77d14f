//! The immutable [`Uri`] value type.
//!
//! A `Uri` owns fully-normalized components and never changes after
//! construction: every `with_*` mutator returns a new instance and leaves the
//! receiver untouched. Derived forms (the authority string, the full string
//! form, the parsed query parameters) are memoized lazily; since mutators
//! build a fresh instance with empty caches, a derived value can never go
//! stale.
//!
//! Normalization is eager: parsing `http://example.com:80/%7Efoo/./bar/..`
//! immediately yields scheme `http`, host `example.com`, an elided port and
//! path `/~foo/`. Rendering the string form and re-parsing it is guaranteed
//! to produce an equal `Uri`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::error::UriError;
use crate::normalize::{Normalizer, default_port};
use crate::parser::RawUri;
use crate::validate::{self, Validator};

/// Immutable URI with normalized components and lazy derived caches.
#[derive(Debug, Clone, Default)]
pub struct Uri {
    scheme: String,
    user: String,
    password: Option<String>,
    host: String,
    has_authority: bool,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,

    authority: OnceCell<String>,
    string_form: OnceCell<String>,
    query_params: OnceCell<Vec<(String, String)>>,
}

impl Uri {
    /// Parses and eagerly normalizes `input` with the default normalizer.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        Self::parse_with(input, Normalizer::default_ref())
    }

    /// Parses and eagerly normalizes `input` with a specific normalizer
    /// (for example one configured with `sort_query`).
    pub fn parse_with(input: &str, normalizer: &Normalizer) -> Result<Self, UriError> {
        let raw = RawUri::parse(input)?;
        Ok(Uri {
            scheme: match raw.scheme.as_deref() {
                Some(scheme) => normalizer.scheme(scheme)?,
                None => String::new(),
            },
            user: raw.user.unwrap_or_default(),
            password: raw.password,
            has_authority: raw.host.is_some(),
            host: match raw.host.as_deref() {
                Some(host) => normalizer.host(host)?,
                None => String::new(),
            },
            port: raw.port,
            path: normalizer.path(&raw.path, false),
            query: raw.query.as_deref().map(|q| normalizer.query(q)),
            fragment: raw.fragment.as_deref().map(|f| normalizer.fragment(f)),
            ..Uri::default()
        })
    }

    /// The normalized scheme, empty when absent.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The normalized host, empty when absent.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The normalized path, possibly empty.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The normalized query, `None` when absent.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The normalized fragment, `None` when absent.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The percent-encoded `user[:password]` form, empty when no user is set.
    pub fn user_info(&self) -> String {
        Normalizer::default_ref().user_info(&self.user, self.password.as_deref())
    }

    /// The port, with default-port elision re-applied on every call (the
    /// scheme may differ between derived instances, so this is never cached).
    pub fn port(&self) -> Option<u16> {
        self.port.filter(|p| Some(*p) != default_port(&self.scheme))
    }

    /// The composed `user[:password]@host[:port]` string, memoized.
    pub fn authority(&self) -> &str {
        self.authority.get_or_init(|| {
            let mut out = String::new();
            let user_info = self.user_info();
            if !user_info.is_empty() {
                out.push_str(&user_info);
                out.push('@');
            }
            out.push_str(&self.host);
            if let Some(port) = self.port() {
                out.push(':');
                out.push_str(&port.to_string());
            }
            out
        })
    }

    /// The parsed query parameters in query order, memoized.
    pub fn query_params(&self) -> &[(String, String)] {
        self.query_params.get_or_init(|| match self.query.as_deref() {
            None | Some("") => Vec::new(),
            Some(query) => serde_urlencoded::from_str(query).unwrap_or_default(),
        })
    }

    /// True iff the URI has a scheme but no authority and a rootless path.
    pub fn is_opaque(&self) -> bool {
        !self.scheme.is_empty() && self.authority().is_empty() && !self.path.starts_with('/')
    }

    /// True iff both scheme and host are present.
    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_empty() && !self.host.is_empty()
    }

    /// Compares against the normalized form of `other`; an unparsable
    /// `other` is never equal.
    pub fn equals(&self, other: &str) -> bool {
        Uri::parse(other).is_ok_and(|parsed| parsed == *self)
    }

    /// Returns a new `Uri` with the given scheme (empty clears it).
    pub fn with_scheme(&self, scheme: &str) -> Result<Self, UriError> {
        let mut next = self.fresh();
        next.scheme = if scheme.is_empty() {
            String::new()
        } else {
            Normalizer::default_ref().scheme(scheme)?
        };
        Ok(next)
    }

    /// Returns a new `Uri` with the given host (empty clears the authority).
    pub fn with_host(&self, host: &str) -> Result<Self, UriError> {
        let mut next = self.fresh();
        next.host = Normalizer::default_ref().host(host)?;
        next.has_authority = !next.host.is_empty();
        Ok(next)
    }

    /// Returns a new `Uri` with the given user credentials, stored raw and
    /// encoded on output.
    pub fn with_user_info(&self, user: &str, password: Option<&str>) -> Self {
        let mut next = self.fresh();
        next.user = user.to_string();
        next.password = password.map(str::to_string);
        next
    }

    /// Returns a new `Uri` with the given port (`None` clears it). Elision
    /// against the scheme's default port happens on read.
    pub fn with_port(&self, port: Option<u16>) -> Self {
        let mut next = self.fresh();
        next.port = port;
        next
    }

    /// Returns a new `Uri` with the given path, normalized.
    ///
    /// A literal `?` or `#`, or a `%` that does not start a full `%XX`
    /// triple, would change meaning under encoding and is rejected; anything
    /// else is percent-encoded as needed.
    pub fn with_path(&self, path: &str) -> Result<Self, UriError> {
        if !Validator::lenient().path(path) || !validate::percent_triples_ok(path) {
            return Err(UriError::InvalidPath(path.to_string()));
        }
        let mut next = self.fresh();
        next.path = Normalizer::default_ref().path(path, false);
        Ok(next)
    }

    /// Returns a new `Uri` with the given query, normalized (`None` clears
    /// it). A literal `#` or a malformed `%XX` triple is rejected.
    pub fn with_query(&self, query: Option<&str>) -> Result<Self, UriError> {
        if let Some(q) = query {
            if !Validator::lenient().query(q) || !validate::percent_triples_ok(q) {
                return Err(UriError::InvalidQuery(q.to_string()));
            }
        }
        let mut next = self.fresh();
        next.query = query.map(|q| Normalizer::default_ref().query(q));
        Ok(next)
    }

    /// Returns a new `Uri` whose query is built from `pairs` in order.
    pub fn with_query_params(&self, pairs: &[(String, String)]) -> Self {
        let normalizer = Normalizer::default_ref();
        let query = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", normalizer.encode(key), normalizer.encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let mut next = self.fresh();
        next.query = Some(query);
        next
    }

    /// Returns a new `Uri` with the given fragment, normalized (`None`
    /// clears it). A malformed `%XX` triple is rejected.
    pub fn with_fragment(&self, fragment: Option<&str>) -> Result<Self, UriError> {
        if let Some(f) = fragment {
            if !validate::percent_triples_ok(f) {
                return Err(UriError::InvalidFragment(f.to_string()));
            }
        }
        let mut next = self.fresh();
        next.fragment = fragment.map(|f| Normalizer::default_ref().fragment(f));
        Ok(next)
    }

    /// Resolves `relative` against this URI per
    /// [RFC 3986 Section 5.2](https://datatracker.ietf.org/doc/html/rfc3986#section-5.2).
    ///
    /// Fails with [`UriError::NotAbsolute`] when `self` lacks a scheme or
    /// host.
    pub fn resolve(&self, relative: &Uri) -> Result<Self, UriError> {
        if !self.is_absolute() {
            return Err(UriError::NotAbsolute);
        }
        if !relative.scheme.is_empty() {
            return Ok(relative.fresh());
        }
        if !relative.host.is_empty() {
            let mut target = relative.fresh();
            target.scheme = self.scheme.clone();
            return Ok(target);
        }

        let mut target = self.fresh();
        target.fragment = relative.fragment.clone();
        if relative.path.is_empty() {
            target.query = relative.query.clone().or_else(|| self.query.clone());
        } else {
            target.query = relative.query.clone();
            if relative.path.starts_with('/') {
                target.path = relative.path.clone();
            } else {
                let base_dir = match self.path.rfind('/') {
                    Some(i) => &self.path[..=i],
                    None => "/",
                };
                let merged = format!("{base_dir}{}", relative.path);
                target.path = Normalizer::default_ref().path(&merged, true);
            }
        }
        Ok(target)
    }

    /// Copies the components into a new instance with empty caches.
    fn fresh(&self) -> Self {
        Uri {
            scheme: self.scheme.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            host: self.host.clone(),
            has_authority: self.has_authority,
            port: self.port,
            path: self.path.clone(),
            query: self.query.clone(),
            fragment: self.fragment.clone(),
            authority: OnceCell::new(),
            string_form: OnceCell::new(),
            query_params: OnceCell::new(),
        }
    }

    /// Serializes the components. Shared rule with the builder: the path is
    /// prefixed with `/` iff an authority is present and the path does not
    /// already start with one.
    fn compose(&self) -> String {
        let mut out = String::new();
        if !self.scheme.is_empty() {
            out.push_str(&self.scheme);
            out.push(':');
        }
        if self.has_authority || !self.authority().is_empty() {
            out.push_str("//");
            out.push_str(self.authority());
            if !self.path.is_empty() && !self.path.starts_with('/') {
                out.push('/');
            }
        }
        out.push_str(&self.path);
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string_form.get_or_init(|| self.compose()))
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = UriError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uri::parse(value)
    }
}

/// Equality over the fully-normalized string form.
impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Uri {}

impl PartialEq<str> for Uri {
    fn eq(&self, other: &str) -> bool {
        self.equals(other)
    }
}

impl PartialEq<&str> for Uri {
    fn eq(&self, other: &&str) -> bool {
        self.equals(other)
    }
}

impl Hash for Uri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
