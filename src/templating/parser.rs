//! # Template Parser
//!
//! Splits template text into segments:
//!
//! ```text
//! <#@ name attr="value" #>   directive
//! <#= expression #>          expression, rendered into the output
//! <# statement #>            control flow
//! <#+ feature #>             class feature (hoisted macro definitions)
//! anything else              literal text
//! ```
//!
//! `\<#` produces a literal `<#`. A newline directly after a directive,
//! statement or class feature belongs to that block, so a block on a line of
//! its own leaves no blank line behind.
//!
//! The parser never fails: problems are recorded on [`ParsedTemplate::errors`]
//! and parsing continues with whatever could be recovered.

use crate::diagnostics::{Diagnostic, Diagnostics, Location};

const BLOCK_OPEN: &str = "<#";
const BLOCK_CLOSE: &str = "#>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Expression,
    Statement,
    ClassFeature,
    Directive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
    pub location: Location,
    /// The block swallowed the newline that followed its closing tag.
    pub trailing_newline: bool,
}

impl Segment {
    fn new(kind: SegmentKind, text: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
            trailing_newline: false,
        }
    }

    /// Number of line breaks this segment spans in the source.
    pub fn line_breaks(&self) -> usize {
        self.text.matches('\n').count() + usize::from(self.trailing_newline)
    }
}

/// A `<#@ ... #>` directive. Attribute names compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub location: Location,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedTemplate {
    pub segments: Vec<Segment>,
    pub directives: Vec<Directive>,
    pub errors: Diagnostics,
}

impl ParsedTemplate {
    /// All `parameter` directives, in declaration order.
    pub fn parameter_directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| d.is("parameter"))
    }

    /// First `parameter` directive whose `name` attribute equals `name`.
    pub fn find_parameter(&self, name: &str) -> Option<&Directive> {
        self.parameter_directives()
            .find(|d| d.attribute("name") == Some(name))
    }

    pub fn directives_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.directives.iter().filter(move |d| d.is(name))
    }
}

/// Maps byte offsets to 1-based line/column pairs.
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, starts }
    }

    fn locate(&self, offset: usize, file: Option<&str>) -> Location {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.text[self.starts[line]..offset].chars().count() + 1;
        Location::new(file.map(str::to_string), line + 1, column)
    }
}

/// Parses template text. `file` is only used to label locations.
pub fn parse(file: Option<&str>, text: &str) -> ParsedTemplate {
    let index = LineIndex::new(text);
    let mut parsed = ParsedTemplate::default();
    let mut pending_text = String::new();
    let mut text_start = 0;
    let mut pos = 0;

    loop {
        let Some(found) = text[pos..].find(BLOCK_OPEN).map(|i| i + pos) else {
            pending_text.push_str(&text[pos..]);
            break;
        };

        if found > 0 && text.as_bytes()[found - 1] == b'\\' {
            pending_text.push_str(&text[pos..found - 1]);
            pending_text.push_str(BLOCK_OPEN);
            pos = found + BLOCK_OPEN.len();
            continue;
        }

        pending_text.push_str(&text[pos..found]);
        flush_text(&mut parsed, &mut pending_text, index.locate(text_start, file));

        let location = index.locate(found, file);
        let (kind, content_start) = match text[found + BLOCK_OPEN.len()..].chars().next() {
            Some('@') => (SegmentKind::Directive, found + 3),
            Some('=') => (SegmentKind::Expression, found + 3),
            Some('+') => (SegmentKind::ClassFeature, found + 3),
            _ => (SegmentKind::Statement, found + 2),
        };

        let Some(close) = text[content_start..]
            .find(BLOCK_CLOSE)
            .map(|i| i + content_start)
        else {
            parsed
                .errors
                .push(Diagnostic::error("Unclosed block: missing '#>'").at(&location));
            pos = text.len();
            text_start = pos;
            break;
        };

        let content = &text[content_start..close];
        if let Some(nested) = content.find(BLOCK_OPEN) {
            parsed.errors.push(
                Diagnostic::error("Unexpected '<#' inside a block")
                    .at(&index.locate(content_start + nested, file)),
            );
        }

        pos = close + BLOCK_CLOSE.len();
        let mut segment = Segment::new(kind, content, location.clone());
        if kind != SegmentKind::Expression {
            if text[pos..].starts_with("\r\n") {
                pos += 2;
                segment.trailing_newline = true;
            } else if text[pos..].starts_with('\n') {
                pos += 1;
                segment.trailing_newline = true;
            }
        }

        if kind == SegmentKind::Directive {
            match parse_directive(content) {
                Ok(directive) => parsed.directives.push(directive.with_location(location)),
                Err(message) => parsed.errors.push(Diagnostic::error(message).at(&location)),
            }
        }
        parsed.segments.push(segment);
        text_start = pos;
    }

    flush_text(&mut parsed, &mut pending_text, index.locate(text_start, file));
    parsed
}

fn flush_text(parsed: &mut ParsedTemplate, pending: &mut String, location: Location) {
    if !pending.is_empty() {
        let text = std::mem::take(pending);
        parsed
            .segments
            .push(Segment::new(SegmentKind::Text, text, location));
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Parses the inside of a directive block: `name key="value" key='value'`.
pub(crate) fn parse_directive(content: &str) -> Result<Directive, String> {
    let mut chars = content.trim().char_indices().peekable();
    let body = content.trim();

    let name_end = body
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    if name_end == 0 {
        return Err("Directive is missing a name".to_string());
    }
    let mut directive = Directive::new(&body[..name_end]);
    while chars.peek().is_some_and(|(i, _)| *i < name_end) {
        chars.next();
    }

    loop {
        while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            chars.next();
        }
        let Some(&(key_start, _)) = chars.peek() else {
            break;
        };

        let mut key_end = key_start;
        while let Some(&(i, c)) = chars.peek() {
            if !is_name_char(c) {
                break;
            }
            key_end = i + c.len_utf8();
            chars.next();
        }
        if key_end == key_start {
            return Err(format!(
                "Unexpected character in directive '{}'",
                directive.name
            ));
        }
        let key = &body[key_start..key_end];

        while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            chars.next();
        }
        if chars.next().map(|(_, c)| c) != Some('=') {
            return Err(format!(
                "Attribute '{}' in directive '{}' is missing a value",
                key, directive.name
            ));
        }
        while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            chars.next();
        }

        let quote = match chars.next() {
            Some((_, q @ ('"' | '\''))) => q,
            _ => {
                return Err(format!(
                    "Value of attribute '{}' in directive '{}' must be quoted",
                    key, directive.name
                ))
            }
        };

        let mut value = String::new();
        let mut closed = false;
        while let Some((_, c)) = chars.next() {
            if c == '\\' && chars.peek().is_some_and(|(_, n)| *n == quote) {
                value.push(quote);
                chars.next();
            } else if c == quote {
                closed = true;
                break;
            } else {
                value.push(c);
            }
        }
        if !closed {
            return Err(format!(
                "Unterminated value for attribute '{}' in directive '{}'",
                key, directive.name
            ));
        }
        directive.set_attribute(key, value);
    }

    Ok(directive)
}
