use thiserror::Error;

/// Errors produced by the URI subsystem.
///
/// Two kinds of failure are distinguished: a raw string that cannot be split
/// into syntactic components at all ([`UriError::Malformed`]), and a single
/// component that fails validation or normalization (the `Invalid*` variants).
/// Callers that only care about the kind can match on [`UriError::is_malformed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("malformed uri: {reason}")]
    Malformed { reason: String },

    #[error("invalid scheme: {0:?}")]
    InvalidScheme(String),

    #[error("invalid host: {0:?}")]
    InvalidHost(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("invalid query: {0:?}")]
    InvalidQuery(String),

    #[error("invalid fragment: {0:?}")]
    InvalidFragment(String),

    #[error("idna conversion failed for host: {host:?}")]
    Idna { host: String },

    #[error("base uri is not absolute")]
    NotAbsolute,
}

impl UriError {
    pub fn malformed<S: ToString>(reason: S) -> Self {
        Self::Malformed { reason: reason.to_string() }
    }

    pub fn idna<S: ToString>(host: S) -> Self {
        Self::Idna { host: host.to_string() }
    }

    /// Returns true when the whole string failed syntactic splitting, as
    /// opposed to a single component failing validation.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
