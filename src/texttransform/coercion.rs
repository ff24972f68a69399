//! # Parameter Coercion
//!
//! `-p name=value` properties arrive as strings. When the template declares a
//! parameter of that name with a non-string type, the value is converted to
//! that type before it goes into the session. A value that cannot be
//! converted is reported and then passed through as its original string.

use crate::engine::TemplateEngine;
use crate::options::Properties;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use templating::{Diagnostic, Diagnostics, ParsedTemplate, Session, SessionValue, STRING_TYPE};
use thiserror::Error;
use uuid::Uuid;

/// Parameter types a property value can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    DateTime,
    Guid,
    Object,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConversionError {
    #[error("type '{0}' could not be resolved")]
    UnknownType(String),

    #[error("type '{0}' cannot be converted from a string")]
    NoConverter(String),

    #[error("'{value}' is not a valid {type_name}")]
    Invalid { value: String, type_name: String },
}

type Converter = fn(&str) -> Option<SessionValue>;

impl ParameterType {
    /// Resolves a full type name as produced by the engine's type-name mapping.
    pub fn resolve(type_name: &str) -> Option<Self> {
        let resolved = match type_name {
            "System.String" => Self::String,
            "System.Boolean" => Self::Boolean,
            "System.Char" => Self::Char,
            "System.SByte" => Self::SByte,
            "System.Byte" => Self::Byte,
            "System.Int16" => Self::Int16,
            "System.UInt16" => Self::UInt16,
            "System.Int32" => Self::Int32,
            "System.UInt32" => Self::UInt32,
            "System.Int64" => Self::Int64,
            "System.UInt64" => Self::UInt64,
            "System.Single" => Self::Single,
            "System.Double" => Self::Double,
            "System.DateTime" => Self::DateTime,
            "System.Guid" => Self::Guid,
            "System.Object" => Self::Object,
            _ => return None,
        };
        Some(resolved)
    }

    fn converter(self) -> Option<Converter> {
        let converter: Converter = match self {
            Self::String => |s| Some(SessionValue::from(s)),
            Self::Boolean => parse_bool,
            Self::Char => parse_char,
            Self::SByte => |s| signed(s, i8::MIN.into(), i8::MAX.into()),
            Self::Byte => |s| unsigned(s, u8::MAX.into()),
            Self::Int16 => |s| signed(s, i16::MIN.into(), i16::MAX.into()),
            Self::UInt16 => |s| unsigned(s, u16::MAX.into()),
            Self::Int32 => |s| signed(s, i32::MIN.into(), i32::MAX.into()),
            Self::UInt32 => |s| unsigned(s, u32::MAX.into()),
            Self::Int64 => |s| signed(s, i64::MIN.into(), i64::MAX.into()),
            Self::UInt64 => |s| unsigned(s, u64::MAX.into()),
            Self::Single => parse_single,
            Self::Double => |s| s.trim().parse().ok().map(SessionValue::Float),
            Self::DateTime => parse_datetime,
            Self::Guid => |s| Uuid::parse_str(s.trim()).ok().map(SessionValue::Guid),
            Self::Object => return None,
        };
        Some(converter)
    }
}

fn parse_bool(s: &str) -> Option<SessionValue> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(SessionValue::Bool(true))
    } else if s.eq_ignore_ascii_case("false") {
        Some(SessionValue::Bool(false))
    } else {
        None
    }
}

/// Single precision range and rounding, stored as the shortest decimal that
/// round-trips through `f32` so `0.1` stays `0.1` once widened.
fn parse_single(s: &str) -> Option<SessionValue> {
    let s = s.trim();
    let value: f32 = s.parse().ok()?;
    if value.is_infinite() && !s.to_ascii_lowercase().contains("inf") {
        return None;
    }
    value.to_string().parse().ok().map(SessionValue::Float)
}

fn parse_char(s: &str) -> Option<SessionValue> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(SessionValue::Char(c)),
        _ => None,
    }
}

/// Decimal, or hex with a `0x` or `&h` prefix.
fn parse_integer(s: &str) -> Option<i128> {
    let s = s.trim();
    let hex = ["0x", "0X", "&h", "&H"]
        .iter()
        .find_map(|prefix| s.strip_prefix(prefix));
    match hex {
        Some(digits) => i128::from_str_radix(digits, 16).ok(),
        None => s.parse().ok(),
    }
}

fn signed(s: &str, min: i128, max: i128) -> Option<SessionValue> {
    let value = parse_integer(s).filter(|v| (min..=max).contains(v))?;
    i64::try_from(value).ok().map(SessionValue::Int)
}

fn unsigned(s: &str, max: u128) -> Option<SessionValue> {
    let value = u128::try_from(parse_integer(s)?).ok().filter(|v| *v <= max)?;
    u64::try_from(value).ok().map(SessionValue::UInt)
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`. Values without an offset are UTC.
fn parse_datetime(s: &str) -> Option<SessionValue> {
    let s = s.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(s) {
        return Some(SessionValue::DateTime(value));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(SessionValue::DateTime(naive.and_utc().fixed_offset()))
}

/// Converts `value` to the type named `type_name`.
pub fn convert(type_name: &str, value: &str) -> Result<SessionValue, ConversionError> {
    let parameter_type = ParameterType::resolve(type_name)
        .ok_or_else(|| ConversionError::UnknownType(type_name.to_string()))?;
    let converter = parameter_type
        .converter()
        .ok_or_else(|| ConversionError::NoConverter(type_name.to_string()))?;
    converter(value).ok_or_else(|| ConversionError::Invalid {
        value: value.to_string(),
        type_name: type_name.to_string(),
    })
}

/// Moves `properties` into `session`, typed per the template's parameter directives.
///
/// Conversion errors quote the type as declared in the template, not its mapped name.
/// Must run after parsing, so the directives are known, and before the
/// template is processed. Conversion failures are appended to `errors`.
pub fn coerce_parameters<E: TemplateEngine + ?Sized>(
    engine: &E,
    parsed: &ParsedTemplate,
    properties: &Properties,
    session: &mut Session,
    errors: &mut Diagnostics,
) {
    for (name, value) in properties {
        let Some(directive) = parsed.find_parameter(name) else {
            session.insert(name.clone(), SessionValue::from(value.as_str()));
            continue;
        };

        let declared = directive.attribute("type");
        let type_name = engine.map_type_name(declared);
        if type_name == STRING_TYPE {
            session.insert(name.clone(), SessionValue::from(value.as_str()));
            continue;
        }

        match convert(&type_name, value) {
            Ok(converted) => {
                tracing::debug!(%name, kind = converted.kind(), "converted parameter");
                session.insert(name.clone(), converted);
            }
            Err(err) => {
                tracing::debug!(%name, %err, "parameter conversion failed");
                errors.push(Diagnostic::error(format!(
                    "Could not convert property '{}'='{}' to parameter type '{}'",
                    name,
                    value,
                    declared.unwrap_or_default()
                )));
                session.insert(name.clone(), SessionValue::from(value.as_str()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingEngine;

    fn properties(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(engine: &RecordingEngine, pairs: &[(&str, &str)]) -> (Session, Diagnostics) {
        let parsed = engine.parse_template(None, "x");
        let mut session = Session::new();
        let mut errors = Diagnostics::new();
        coerce_parameters(engine, &parsed, &properties(pairs), &mut session, &mut errors);
        (session, errors)
    }

    #[test]
    fn test_declared_int_is_converted() {
        let engine = RecordingEngine::new().with_parameter("count", Some("System.Int32"));
        let (session, errors) = run(&engine, &[("count", "5")]);
        assert!(errors.is_empty());
        assert_eq!(session.get("count"), Some(&SessionValue::Int(5)));
    }

    #[test]
    fn test_failed_conversion_falls_back_to_string() {
        let engine = RecordingEngine::new().with_parameter("count", Some("int"));
        let (session, errors) = run(&engine, &[("count", "abc")]);

        assert!(errors.has_errors());
        let message = &errors.iter().next().unwrap().message;
        assert_eq!(
            message,
            "Could not convert property 'count'='abc' to parameter type 'int'"
        );
        assert_eq!(session.get("count"), Some(&SessionValue::from("abc")));
    }

    #[test]
    fn test_undeclared_property_is_stored_verbatim() {
        let engine = RecordingEngine::new().with_parameter("count", Some("int"));
        let (session, errors) = run(&engine, &[("other", "5")]);
        assert!(errors.is_empty());
        assert_eq!(session.get("other"), Some(&SessionValue::from("5")));
    }

    #[test]
    fn test_untyped_parameter_is_string() {
        let engine = RecordingEngine::new().with_parameter("name", None);
        let (session, errors) = run(&engine, &[("name", "42")]);
        assert!(errors.is_empty());
        assert_eq!(session.get("name"), Some(&SessionValue::from("42")));
    }

    #[test]
    fn test_unresolvable_type_is_an_error() {
        let engine = RecordingEngine::new().with_parameter("x", Some("My.Widget"));
        let (session, errors) = run(&engine, &[("x", "1")]);
        assert_eq!(errors.error_count(), 1);
        assert_eq!(session.get("x"), Some(&SessionValue::from("1")));
    }

    #[test]
    fn test_object_has_no_converter() {
        assert_eq!(
            convert("System.Object", "1"),
            Err(ConversionError::NoConverter("System.Object".into()))
        );
    }

    #[test]
    fn test_no_properties_touches_nothing() {
        let engine = RecordingEngine::new().with_parameter("count", Some("int"));
        let (session, errors) = run(&engine, &[]);
        assert!(session.is_empty());
        assert!(errors.is_empty());
        assert!(!engine
            .calls()
            .iter()
            .any(|call| matches!(call, crate::engine::EngineCall::MapTypeName(_))));
    }

    #[test]
    fn test_integer_forms_and_ranges() {
        assert_eq!(convert("System.Int32", " 42 "), Ok(SessionValue::Int(42)));
        assert_eq!(convert("System.Int32", "-7"), Ok(SessionValue::Int(-7)));
        assert_eq!(convert("System.Int32", "0x1F"), Ok(SessionValue::Int(31)));
        assert_eq!(convert("System.Int64", "&hFF"), Ok(SessionValue::Int(255)));
        assert_eq!(convert("System.Byte", "255"), Ok(SessionValue::UInt(255)));
        assert!(convert("System.Byte", "256").is_err());
        assert!(convert("System.UInt32", "-1").is_err());
        assert!(convert("System.SByte", "128").is_err());
        assert_eq!(
            convert("System.UInt64", "18446744073709551615"),
            Ok(SessionValue::UInt(u64::MAX))
        );
    }

    #[test]
    fn test_bool_char_and_float() {
        assert_eq!(convert("System.Boolean", "TRUE"), Ok(SessionValue::Bool(true)));
        assert_eq!(convert("System.Boolean", " false"), Ok(SessionValue::Bool(false)));
        assert!(convert("System.Boolean", "yes").is_err());
        assert_eq!(convert("System.Char", "z"), Ok(SessionValue::Char('z')));
        assert!(convert("System.Char", "zz").is_err());
        assert_eq!(convert("System.Double", "2.5"), Ok(SessionValue::Float(2.5)));
        assert_eq!(convert("System.Single", "0.5"), Ok(SessionValue::Float(0.5)));
    }

    #[test]
    fn test_single_keeps_its_decimal_form() {
        let value = convert("System.Single", "0.1").unwrap();
        assert_eq!(value, SessionValue::Float(0.1));
        assert_eq!(value.to_string(), "0.1");

        let rounded = convert("System.Single", "0.123456789").unwrap();
        assert_eq!(rounded, SessionValue::Float(0.12345679));
        assert!(convert("System.Single", "1e39").is_err());
    }

    #[test]
    fn test_datetime_and_guid() {
        let date = convert("System.DateTime", "2024-03-01").unwrap();
        assert_eq!(date.to_string(), "2024-03-01T00:00:00+00:00");

        let stamp = convert("System.DateTime", "2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(stamp.to_string(), "2024-03-01T10:30:00+02:00");

        assert!(convert("System.DateTime", "yesterday").is_err());

        let guid = convert("System.Guid", "67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(guid.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }
}
