//! Row-oriented CSV codec in the style of
//! [RFC 4180](https://datatracker.ietf.org/doc/html/rfc4180).
//!
//! Fields may be double-quoted; a doubled quote inside a quoted field
//! escapes it, and a quoted field may span line breaks. A malformed row is
//! reported with the 1-based line number where it starts. Both LF and CRLF
//! line endings are accepted; the writer emits LF.

use crate::error::{EncodeError, ParseError};

/// Parses the full body into a list of rows. An empty input yields no rows;
/// a trailing newline does not produce a trailing empty row.
pub fn parse(input: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut row_started = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        quoted = false;
                        match chars.peek() {
                            Some(',' | '\r' | '\n') | None => {}
                            Some(_) => {
                                return Err(ParseError::csv(
                                    row_line,
                                    "data after closing quote",
                                ));
                            }
                        }
                    }
                }
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
        } else {
            match c {
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    row_started = true;
                }
                '"' if field.is_empty() => {
                    quoted = true;
                    row_started = true;
                }
                '"' => return Err(ParseError::csv(row_line, "quote inside unquoted field")),
                // the row ends at the '\n' of a CRLF pair
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    line += 1;
                    if row_started || chars.peek().is_some() {
                        fields.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut fields));
                        row_started = false;
                    }
                    row_line = line;
                }
                _ => {
                    field.push(c);
                    row_started = true;
                }
            }
        }
    }
    if quoted {
        return Err(ParseError::csv(row_line, "unterminated quoted field"));
    }
    if row_started {
        fields.push(field);
        rows.push(fields);
    }
    Ok(rows)
}

/// Serializes rows, quoting fields that contain a separator, quote or line
/// break.
pub fn write(rows: &[Vec<String>]) -> Result<String, EncodeError> {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|f| escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    Ok(out)
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
