use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// HTTP protocol version carried by a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Version {
    Http10,
    #[default]
    Http11,
    Http2,
    Http3,
}

impl Version {
    /// Short form used by the message model: `"1.1"`, `"2"`, `"3"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "1.0",
            Version::Http11 => "1.1",
            Version::Http2 => "2",
            Version::Http3 => "3",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}", self.as_str())
    }
}

/// Accepts the short forms (`"1.1"`, `"2"`, `"2.0"`, `"3"`) and the
/// `"HTTP/x"` spellings found in server environments.
impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix("HTTP/").unwrap_or(s);
        match short {
            "1.0" => Ok(Version::Http10),
            "1.1" => Ok(Version::Http11),
            "2" | "2.0" => Ok(Version::Http2),
            "3" | "3.0" => Ok(Version::Http3),
            _ => Err(ParseError::Version(s.to_string())),
        }
    }
}
