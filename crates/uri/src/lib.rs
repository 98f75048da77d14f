//! RFC 3986 URI parsing, validation, normalization and an immutable value type.
//!
//! This crate provides the URI subsystem of the message value-object library:
//! a layered pipeline from raw strings to canonical, immutable [`Uri`]
//! values.
//!
//! # Architecture
//!
//! The crate is organized leaf-first:
//!
//! - [`parser`]: positional splitting of a URI string into raw components,
//!   with no canonicalization
//! - [`Validator`]: stateless per-component syntax predicates with a
//!   strict/lenient switch
//! - [`Normalizer`]: pure canonicalization of each component
//!   (percent-encoding, case folding, IPv4/IPv6 canonical forms, IDNA,
//!   default-port elision, dot-segment removal, query canonicalization)
//! - [`UriBuilder`]: reassembly of component values into a URI string, raw
//!   or validated
//! - [`Uri`]: the immutable value type with copy-on-write `with_*` mutators,
//!   lazy derived caches and RFC 3986 Section 5.2 reference resolution
//!
//! # Example
//!
//! ```
//! use tidy_uri::Uri;
//!
//! let uri = Uri::parse("http://example.com:80/%7Efoo/./bar/baz/../qux/index.html#fragment")?;
//! assert_eq!(uri.to_string(), "http://example.com/~foo/bar/qux/index.html#fragment");
//! assert_eq!(uri.port(), None); // default port elided
//!
//! let moved = uri.with_host("other.example")?;
//! assert_eq!(moved.host(), "other.example");
//! assert_eq!(uri.host(), "example.com"); // the receiver is untouched
//! # Ok::<_, tidy_uri::UriError>(())
//! ```
//!
//! # Guarantees
//!
//! - Normalization is idempotent: re-parsing a `Uri`'s string form yields an
//!   equal `Uri`.
//! - Every derived instance is internally consistent: memoized forms
//!   (authority, string form, query parameters) are computed per instance
//!   and can never go stale.
//! - `Uri` values are immutable and safe to share across threads.

pub mod parser;

mod builder;
mod error;
mod normalize;
mod uri;
mod validate;

pub use builder::UriBuilder;
pub use error::UriError;
pub use normalize::{Normalizer, default_port};
pub use uri::Uri;
pub use validate::Validator;
