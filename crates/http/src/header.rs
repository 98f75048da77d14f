//! Ordered, case-insensitive header storage.
//!
//! Lookup is case-insensitive, but the original spelling of each header name
//! is preserved for serialization. Within a header, value order follows
//! insertion; across headers, first-insertion order is kept.
//!
//! Every insertion validates the name against the token grammar of
//! [RFC 9110 Section 5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-5.1)
//! and the value against the field-value byte set — in particular, embedded
//! CR/LF is rejected so header injection cannot pass through the model.

use crate::error::HeaderError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Entry {
    /// Lowercased lookup key.
    lower: String,
    /// Original spelling, as last set.
    name: String,
    values: Vec<String>,
}

/// Case-insensitive multi-map preserving insertion order and original casing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<Entry>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// First value of the header, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// All values of the header, in insertion order.
    pub fn values(&self, name: &str) -> &[String] {
        match self.find(name) {
            Some(i) => &self.entries[i].values,
            None => &[],
        }
    }

    /// Values joined with `", "`, or `None` when the header is absent.
    pub fn line(&self, name: &str) -> Option<String> {
        self.find(name).map(|i| self.entries[i].values.join(", "))
    }

    /// Replaces all values for `name`, adopting the given spelling.
    pub fn set(&mut self, name: &str, values: Vec<String>) -> Result<(), HeaderError> {
        validate_name(name)?;
        for value in &values {
            validate_value(name, value)?;
        }
        match self.find(name) {
            Some(i) => {
                self.entries[i].name = name.to_string();
                self.entries[i].values = values;
            }
            None => self.entries.push(Entry {
                lower: name.to_ascii_lowercase(),
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Appends a value to `name`, creating the header when absent.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        validate_name(name)?;
        validate_value(name, value)?;
        match self.find(name) {
            Some(i) => self.entries[i].values.push(value.to_string()),
            None => self.entries.push(Entry {
                lower: name.to_ascii_lowercase(),
                name: name.to_string(),
                values: vec![value.to_string()],
            }),
        }
        Ok(())
    }

    /// Removes the header entirely, both spelling and values.
    pub fn remove(&mut self, name: &str) {
        if let Some(i) = self.find(name) {
            self.entries.remove(i);
        }
    }

    /// Iterates `(original_name, values)` in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.lower.eq_ignore_ascii_case(name))
    }
}

/// `token = 1*tchar`
fn validate_name(name: &str) -> Result<(), HeaderError> {
    if name.is_empty() || !name.bytes().all(is_tchar) {
        return Err(HeaderError::invalid_name(name));
    }
    Ok(())
}

pub(crate) fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Visible ASCII, SP, HTAB and obs-text; CR, LF and NUL are rejected.
fn validate_value(name: &str, value: &str) -> Result<(), HeaderError> {
    for b in value.bytes() {
        let ok = b == b'\t' || (0x20..=0x7e).contains(&b) || b >= 0x80;
        if !ok {
            let reason = match b {
                b'\r' | b'\n' => "embedded CR/LF",
                _ => "illegal byte",
            };
            return Err(HeaderError::invalid_value(name, reason));
        }
    }
    Ok(())
}
