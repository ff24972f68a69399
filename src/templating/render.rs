//! Compiles parsed segments into minijinja source and renders it.
//!
//! Every generated line keeps a pointer back to the template line it came
//! from, so render errors are reported against the original file.

use crate::diagnostics::{Diagnostic, Location};
use crate::host::EngineOptions;
use crate::parser::{ParsedTemplate, Segment, SegmentKind};
use crate::types::Session;
use minijinja::{AutoEscape, Environment, Error, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name the generated source is registered under.
pub const TEMPLATE_NAME: &str = "template";

#[derive(Debug, Clone)]
struct Span {
    /// First generated line (1-based) covered by this span.
    start: usize,
    /// Byte offset of the span in the generated source.
    offset: usize,
    origin: Location,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledTemplate {
    pub source: String,
    spans: Vec<Span>,
}

impl CompiledTemplate {
    /// Maps a line of the generated source back to the template.
    pub fn source_location(&self, line: usize) -> Option<Location> {
        let span = self.spans.iter().rev().find(|s| s.start <= line)?;
        Some(Location::new(
            span.origin.file.clone(),
            span.origin.line + (line - span.start),
            0,
        ))
    }

    /// The generated source split per template segment, with each piece's origin.
    pub fn chunks(&self) -> impl Iterator<Item = (&Location, &str)> {
        let ends = self
            .spans
            .iter()
            .skip(1)
            .map(|s| s.offset)
            .chain(std::iter::once(self.source.len()));
        self.spans
            .iter()
            .zip(ends)
            .map(|(span, end)| (&span.origin, &self.source[span.offset..end]))
    }
}

struct Compiler {
    out: String,
    line: usize,
    spans: Vec<Span>,
}

impl Compiler {
    fn new() -> Self {
        Self {
            out: String::new(),
            line: 1,
            spans: Vec::new(),
        }
    }

    fn begin(&mut self, segment: &Segment) {
        self.spans.push(Span {
            start: self.line,
            offset: self.out.len(),
            origin: segment.location.clone(),
        });
    }

    fn emit(&mut self, text: &str) {
        self.line += text.matches('\n').count();
        self.out.push_str(text);
    }

    fn emit_segment(&mut self, segment: &Segment) {
        self.begin(segment);
        let newline = if segment.trailing_newline { "\n" } else { "" };
        match segment.kind {
            SegmentKind::Text => self.emit(&escape_text(&segment.text)),
            SegmentKind::Expression => self.emit(&format!("{{{{{}}}}}", segment.text)),
            SegmentKind::Statement if segment.text.trim().is_empty() => {
                self.emit(&blank_comment(segment.line_breaks()))
            }
            SegmentKind::Statement => self.emit(&format!("{{%{}{}%}}", segment.text, newline)),
            SegmentKind::ClassFeature => {
                let content = segment.text.trim();
                let lead = segment.text.len() - segment.text.trim_start().len();
                let lead_breaks = segment.text[..lead].matches('\n').count();
                let rest_breaks =
                    segment.line_breaks() - lead_breaks - content.matches('\n').count();
                self.emit(&blank_comment(lead_breaks));
                self.emit(content);
                self.emit(&blank_comment(rest_breaks));
            }
            SegmentKind::Directive => self.emit(&blank_comment(segment.line_breaks())),
        }
    }

    fn finish(self) -> CompiledTemplate {
        CompiledTemplate {
            source: self.out,
            spans: self.spans,
        }
    }
}

/// A comment spanning `lines` line breaks. Renders to nothing.
fn blank_comment(lines: usize) -> String {
    if lines == 0 {
        return String::new();
    }
    format!("{{#{}#}}", "\n".repeat(lines))
}

/// Escapes literal text so minijinja outputs it unchanged.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = c == '{' && chars.peek().map_or(true, |n| matches!(n, '{' | '%' | '#'));
        if opens_tag {
            escaped.push_str("{{ \"{\" }}");
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Builds minijinja source. Class features are hoisted ahead of the body so
/// the macros they define are visible everywhere.
pub fn compile(parsed: &ParsedTemplate) -> CompiledTemplate {
    let mut compiler = Compiler::new();
    let (features, body): (Vec<&Segment>, Vec<&Segment>) = parsed
        .segments
        .iter()
        .partition(|s| s.kind == SegmentKind::ClassFeature);
    for segment in features.into_iter().chain(body) {
        compiler.emit_segment(segment);
    }
    compiler.finish()
}

/// Host services exposed to `hostspecific` templates.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub template_file: Option<String>,
    pub options: Arc<EngineOptions>,
}

fn environment(host: Option<&HostContext>) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);

    if let Some(host) = host {
        let options = Arc::clone(&host.options);
        env.add_function(
            "host_parameter",
            move |name: String, directive: Option<String>, processor: Option<String>| -> Value {
                options
                    .resolve_host_parameter(processor.as_deref(), directive.as_deref(), &name)
                    .map(Value::from)
                    .unwrap_or(Value::from(()))
            },
        );
        env.add_global(
            "template_file",
            Value::from(host.template_file.clone().unwrap_or_default()),
        );
    }
    env
}

/// Session values are visible both as top-level variables and under `session`.
fn context(session: &Session) -> BTreeMap<String, Value> {
    let mut ctx: BTreeMap<String, Value> = session
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
        .collect();
    ctx.insert("session".to_string(), Value::from_serialize(session));
    ctx
}

/// Converts a minijinja error into a diagnostic against the template.
pub fn to_diagnostic(compiled: &CompiledTemplate, err: &Error) -> Diagnostic {
    let message = match err.detail() {
        Some(detail) => format!("{}: {}", err.kind(), detail),
        None => err.kind().to_string(),
    };
    let diagnostic = Diagnostic::error(message);
    match err.line().and_then(|line| compiled.source_location(line)) {
        Some(location) => diagnostic.at(&location),
        None => diagnostic,
    }
}

/// Renders minijinja source produced by [`compile`], as embedded in
/// preprocessed templates.
pub fn render_source(source: &str, session: &Session) -> Result<String, Error> {
    let mut env = environment(None);
    env.add_template_owned(TEMPLATE_NAME, source.to_string())?;
    env.get_template(TEMPLATE_NAME)?.render(context(session))
}

pub fn render(
    compiled: &CompiledTemplate,
    session: &Session,
    host: Option<&HostContext>,
) -> Result<String, Diagnostic> {
    let mut env = environment(host);
    let result = env
        .add_template_owned(TEMPLATE_NAME, compiled.source.clone())
        .and_then(|_| env.get_template(TEMPLATE_NAME)?.render(context(session)));
    result.map_err(|err| to_diagnostic(compiled, &err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::SessionValue;

    fn render_text(text: &str, session: &Session) -> Result<String, Diagnostic> {
        let parsed = parse(Some("t.tt"), text);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        render(&compile(&parsed), session, None)
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "fn main() {\n    let x = {a};\n}\n{{ not jinja }} {% nope %} {# no #}\n";
        assert_eq!(render_text(text, &Session::new()).unwrap(), text);
    }

    #[test]
    fn test_trailing_open_brace_before_expression() {
        let mut session = Session::new();
        session.insert("x".into(), SessionValue::Int(1));
        assert_eq!(render_text("{<#= x #>}", &session).unwrap(), "{1}");
    }

    #[test]
    fn test_expressions_and_statements() {
        let mut session = Session::new();
        session.insert("count".into(), SessionValue::Int(3));
        let out = render_text(
            "<#@ parameter name=\"count\" type=\"int\" #>\n<# for i in range(count) #>\nrow <#= i #>\n<# endfor #>\ndone\n",
            &session,
        )
        .unwrap();
        assert_eq!(out, "row 0\nrow 1\nrow 2\ndone\n");
    }

    #[test]
    fn test_session_namespace() {
        let mut session = Session::new();
        session.insert("name".into(), SessionValue::from("World"));
        let out = render_text("<#= session.name #>/<#= name #>", &session).unwrap();
        assert_eq!(out, "World/World");
    }

    #[test]
    fn test_class_features_are_hoisted() {
        let out = render_text(
            "<#= greet(\"a\") #>\n<#+ {% macro greet(who) %}hi {{ who }}{% endmacro %} #>\n",
            &Session::new(),
        )
        .unwrap();
        assert_eq!(out, "hi a\n");
    }

    #[test]
    fn test_render_error_maps_to_template_line() {
        let err = render_text("one\ntwo\n<#= 1 + #>\n", &Session::new()).unwrap_err();
        assert!(err.is_error());
        assert_eq!(err.file.as_deref(), Some("t.tt"));
        assert_eq!(err.line, Some(3));
        assert!(err.message.starts_with("syntax error"), "{}", err.message);
    }

    #[test]
    fn test_host_parameter_function() {
        let mut options = EngineOptions::new();
        options.add_host_parameter(None, None, "target", "x86");
        let host = HostContext {
            template_file: Some("/tmp/t.tt".into()),
            options: Arc::new(options),
        };
        let parsed = parse(None, "<#= host_parameter(\"target\") #> <#= template_file #>");
        let out = render(&compile(&parsed), &Session::new(), Some(&host)).unwrap();
        assert_eq!(out, "x86 /tmp/t.tt");
    }

    #[test]
    fn test_source_location_lookup() {
        let parsed = parse(Some("a.tt"), "x\n<#@ output extension=\"y\" #>\nz\n");
        let compiled = compile(&parsed);
        assert_eq!(compiled.source_location(1).unwrap().line, 1);
        assert_eq!(compiled.source_location(3).unwrap().line, 3);
        assert_eq!(compiled.source.matches('\n').count(), 3);
    }

    #[test]
    fn test_chunks_cover_the_source() {
        let parsed = parse(Some("a.tt"), "a <#= b #>\n<# if c #>d<# endif #>");
        let compiled = compile(&parsed);
        let joined: String = compiled.chunks().map(|(_, chunk)| chunk).collect();
        assert_eq!(joined, compiled.source);
        assert_eq!(compiled.chunks().count(), parsed.segments.len());
    }

    #[test]
    fn test_render_source_without_host() {
        let mut session = Session::new();
        session.insert("n".into(), SessionValue::UInt(7));
        assert_eq!(render_source("n={{ n }}", &session).unwrap(), "n=7");
    }
}
