//! Minimal well-formed XML/HTML document codec.
//!
//! The parser builds a plain element tree and performs no DTD processing at
//! all: DOCTYPE declarations (including internal subsets) are skipped
//! unread, and entity references other than the five built-ins and numeric
//! character references are kept verbatim in the text. External entities can
//! therefore never be resolved and no file or network access happens during
//! parsing (XXE is impossible by construction). Malformed markup fails with
//! [`ParseError::Xml`] carrying the first diagnostic.

use std::fmt;

use crate::error::ParseError;

/// Parsed document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), children: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements with the given name.
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

/// Parses a document, requiring exactly one root element.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let mut parser = Parser { chars: input.chars().collect(), pos: 0 };
    parser.skip_misc()?;
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if !parser.at_end() {
        return Err(ParseError::xml("content after the root element"));
    }
    Ok(Document { root })
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> Result<(), ParseError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(ParseError::xml(format!("expected {expected:?}, found {c:?}"))),
            None => Err(ParseError::xml("unexpected end of input")),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skips whitespace, comments, processing instructions and DOCTYPE
    /// declarations outside the root element.
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_ws();
            if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!DOCTYPE") || self.starts_with("<!doctype") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        self.pos += 4;
        self.skip_until("-->")
    }

    fn skip_until(&mut self, end: &str) -> Result<(), ParseError> {
        while !self.at_end() {
            if self.starts_with(end) {
                self.pos += end.chars().count();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(ParseError::xml(format!("unterminated construct, expected {end:?}")))
    }

    /// Consumes the declaration without interpreting it. The internal subset
    /// between `[` and `]` is skipped as opaque text, so entity declarations
    /// are never registered.
    fn skip_doctype(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::xml("unterminated doctype declaration"))
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        self.eat('<')?;
        let name = self.parse_name()?;
        let mut element = Element::new(name);

        loop {
            self.skip_ws();
            match self.peek() {
                Some('/') => {
                    self.pos += 1;
                    self.eat('>')?;
                    return Ok(element);
                }
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let (attr, value) = self.parse_attribute()?;
                    element.attributes.push((attr, value));
                }
                None => return Err(ParseError::xml("unexpected end of input in tag")),
            }
        }

        self.parse_children(&mut element)?;
        Ok(element)
    }

    fn parse_children(&mut self, element: &mut Element) -> Result<(), ParseError> {
        loop {
            if self.starts_with("</") {
                self.pos += 2;
                let name = self.parse_name()?;
                self.skip_ws();
                self.eat('>')?;
                if name != element.name {
                    return Err(ParseError::xml(format!(
                        "mismatched close tag: expected </{}>, found </{name}>",
                        element.name
                    )));
                }
                return Ok(());
            }
            if self.starts_with("<!--") {
                self.skip_comment()?;
                continue;
            }
            if self.starts_with("<![CDATA[") {
                self.pos += 9;
                let start = self.pos;
                self.skip_until("]]>")?;
                let text: String = self.chars[start..self.pos - 3].iter().collect();
                element.children.push(Node::Text(text));
                continue;
            }
            if self.starts_with("<?") {
                self.skip_until("?>")?;
                continue;
            }
            match self.peek() {
                Some('<') => {
                    let child = self.parse_element()?;
                    element.children.push(Node::Element(child));
                }
                Some(_) => {
                    let text = self.parse_text();
                    if !text.is_empty() {
                        element.children.push(Node::Text(text));
                    }
                }
                None => return Err(ParseError::xml("unexpected end of input in element")),
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ParseError::xml("expected a name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attribute(&mut self) -> Result<(String, String), ParseError> {
        let name = self.parse_name()?;
        self.skip_ws();
        self.eat('=')?;
        self.skip_ws();
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(ParseError::xml("attribute value must be quoted")),
        };
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        self.eat(quote)?;
        Ok((name, decode_entities(&raw)))
    }

    fn parse_text(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '<') {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        decode_entities(&raw)
    }
}

/// Decodes the five predefined entities and numeric character references.
/// Anything else (in particular custom entities from a DTD) stays verbatim,
/// so undeclared or external entities can never inject content.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let end = match rest.find(';') {
            Some(i) if i <= 12 => i,
            _ => {
                out.push('&');
                rest = &rest[1..];
                continue;
            }
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn encode_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn encode_attr(value: &str) -> String {
    encode_text(value).replace('"', "&quot;")
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, &self.root)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self)
    }
}

fn write_element(f: &mut fmt::Formatter<'_>, element: &Element) -> fmt::Result {
    write!(f, "<{}", element.name)?;
    for (name, value) in &element.attributes {
        write!(f, " {name}=\"{}\"", encode_attr(value))?;
    }
    if element.children.is_empty() {
        return write!(f, "/>");
    }
    write!(f, ">")?;
    for child in &element.children {
        match child {
            Node::Text(t) => write!(f, "{}", encode_text(t))?,
            Node::Element(e) => write_element(f, e)?,
        }
    }
    write!(f, "</{}>", element.name)
}
