//! Raw request values → typed field values.
//!
//! The conversion pipeline, applied per raw value:
//! 1. trim (text targets keep the untrimmed original unless a rewrite
//!    below applies);
//! 2. a `0x` prefix switches integer parsing to radix 16 and is
//!    stripped;
//! 3. a 7-character `#RRGGBB` token becomes its decimal integer string
//!    (legacy HTML color inputs feeding integer fields);
//! 4. parse according to the declared kind. Floats ignore the radix.
//!    Booleans map the literal `on` (checkbox convention) to `true`,
//!    then accept case-insensitive `true`; anything else is `false` and
//!    never an error. Char targets require exactly one character.
//!
//! List fields run the same pipeline element-wise over every raw value.

use signpost_core::{DispatchError, DispatchResult};

use crate::model::{FieldType, Scalar, ScalarKind, Value};

const HEX_RADIX: u32 = 16;
const DEC_RADIX: u32 = 10;

/// Convert raw values to what the declared field type expects.
pub fn convert(field: &str, values: &[String], target: FieldType) -> DispatchResult<Value> {
    match target {
        FieldType::Scalar(kind) => {
            let raw = values.first().map(String::as_str).unwrap_or("");
            Ok(Value::Scalar(scalar(field, raw, kind)?))
        }
        FieldType::List(kind) => {
            let mut out = Vec::with_capacity(values.len());
            for raw in values {
                out.push(scalar(field, raw, kind)?);
            }
            Ok(Value::List(out))
        }
        FieldType::Nested => Err(DispatchError::ValueConversion {
            field: field.to_string(),
            value: values.first().cloned().unwrap_or_default(),
            target: "nested model".to_string(),
        }),
    }
}

/// Convert one raw value to one scalar.
pub fn scalar(field: &str, raw: &str, kind: ScalarKind) -> DispatchResult<Scalar> {
    let trimmed = raw.trim();

    let (token, radix, rewritten) = match trimmed.strip_prefix("0x") {
        Some(rest) => match color_to_decimal(field, raw, rest)? {
            Some(decimal) => (decimal, DEC_RADIX, true),
            None => (rest.to_string(), HEX_RADIX, true),
        },
        None => match color_to_decimal(field, raw, trimmed)? {
            Some(decimal) => (decimal, DEC_RADIX, true),
            None => (trimmed.to_string(), DEC_RADIX, false),
        },
    };

    let scalar = match kind {
        ScalarKind::Text => {
            if rewritten {
                Scalar::Text(token)
            } else {
                Scalar::Text(raw.to_string())
            }
        }
        ScalarKind::Bool => {
            let token = if token == "on" { "true" } else { token.as_str() };
            Scalar::Bool(token.eq_ignore_ascii_case("true"))
        }
        ScalarKind::Char => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Scalar::Char(c),
                _ => {
                    return Err(DispatchError::CharConversion {
                        field: field.to_string(),
                        value: raw.to_string(),
                    })
                }
            }
        }
        ScalarKind::I8 => Scalar::I8(
            i8::from_str_radix(&token, radix).map_err(|_| conversion_error(field, raw, kind))?,
        ),
        ScalarKind::I16 => Scalar::I16(
            i16::from_str_radix(&token, radix).map_err(|_| conversion_error(field, raw, kind))?,
        ),
        ScalarKind::I32 => Scalar::I32(
            i32::from_str_radix(&token, radix).map_err(|_| conversion_error(field, raw, kind))?,
        ),
        ScalarKind::I64 => Scalar::I64(
            i64::from_str_radix(&token, radix).map_err(|_| conversion_error(field, raw, kind))?,
        ),
        ScalarKind::F32 => Scalar::F32(
            token
                .parse()
                .map_err(|_| conversion_error(field, raw, kind))?,
        ),
        ScalarKind::F64 => Scalar::F64(
            token
                .parse()
                .map_err(|_| conversion_error(field, raw, kind))?,
        ),
    };
    Ok(scalar)
}

/// `#RRGGBB` → decimal integer string. Tokens shaped like a color but
/// holding non-hex digits fail conversion outright.
fn color_to_decimal(field: &str, raw: &str, token: &str) -> DispatchResult<Option<String>> {
    if !token.starts_with('#') || token.chars().count() != 7 {
        return Ok(None);
    }
    let rgb = i64::from_str_radix(&token[1..], 16)
        .map_err(|_| conversion_error(field, raw, ScalarKind::I64))?;
    Ok(Some(rgb.to_string()))
}

fn conversion_error(field: &str, raw: &str, kind: ScalarKind) -> DispatchError {
    DispatchError::ValueConversion {
        field: field.to_string(),
        value: raw.to_string(),
        target: kind.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(raw: &str, kind: ScalarKind) -> DispatchResult<Scalar> {
        scalar("field", raw, kind)
    }

    #[test]
    fn plain_integers() {
        assert_eq!(one("42", ScalarKind::I32).unwrap(), Scalar::I32(42));
        assert_eq!(one(" -7 ", ScalarKind::I64).unwrap(), Scalar::I64(-7));
        assert_eq!(one("127", ScalarKind::I8).unwrap(), Scalar::I8(127));
    }

    #[test]
    fn hex_prefix_switches_radix() {
        assert_eq!(one("0x1F", ScalarKind::I32).unwrap(), Scalar::I32(31));
        assert_eq!(one(" 0xff ", ScalarKind::I64).unwrap(), Scalar::I64(255));
    }

    #[test]
    fn html_color_becomes_decimal() {
        assert_eq!(
            one("#00FF00", ScalarKind::I64).unwrap(),
            Scalar::I64(65280)
        );
        assert_eq!(one("#000010", ScalarKind::I32).unwrap(), Scalar::I32(16));
    }

    #[test]
    fn color_with_bad_digits_fails_even_for_text() {
        let err = one("#zzzzzz", ScalarKind::Text).unwrap_err();
        assert_eq!(err.code(), 1402);
    }

    #[test]
    fn text_keeps_untrimmed_original() {
        assert_eq!(
            one("  hello  ", ScalarKind::Text).unwrap(),
            Scalar::Text("  hello  ".into())
        );
    }

    #[test]
    fn text_after_rewrite_is_the_token() {
        assert_eq!(one("0x1F", ScalarKind::Text).unwrap(), Scalar::Text("1F".into()));
        assert_eq!(
            one("#00FF00", ScalarKind::Text).unwrap(),
            Scalar::Text("65280".into())
        );
    }

    #[test]
    fn checkbox_on_is_true() {
        assert_eq!(one("on", ScalarKind::Bool).unwrap(), Scalar::Bool(true));
        assert_eq!(one("TRUE", ScalarKind::Bool).unwrap(), Scalar::Bool(true));
        assert_eq!(one("yes", ScalarKind::Bool).unwrap(), Scalar::Bool(false));
        assert_eq!(one("", ScalarKind::Bool).unwrap(), Scalar::Bool(false));
    }

    #[test]
    fn char_requires_exactly_one() {
        assert_eq!(one(" A ", ScalarKind::Char).unwrap(), Scalar::Char('A'));
        assert_eq!(one("", ScalarKind::Char).unwrap_err().code(), 1403);
        assert_eq!(one("AB", ScalarKind::Char).unwrap_err().code(), 1403);
    }

    #[test]
    fn floats_ignore_radix() {
        assert_eq!(one("1.5", ScalarKind::F64).unwrap(), Scalar::F64(1.5));
        // stripped hex prefix leaves a plain decimal parse
        assert_eq!(one("0x1.5", ScalarKind::F32).unwrap(), Scalar::F32(1.5));
    }

    #[test]
    fn numeric_garbage_is_a_conversion_error() {
        let err = one("abc", ScalarKind::I32).unwrap_err();
        assert!(matches!(err, DispatchError::ValueConversion { .. }));
        assert_eq!(err.code(), 1402);
    }

    #[test]
    fn lists_convert_element_wise() {
        let values = vec!["1".to_string(), "0x10".to_string(), "#000010".to_string()];
        let out = convert("nums", &values, FieldType::List(ScalarKind::I32)).unwrap();
        assert_eq!(
            out,
            Value::List(vec![Scalar::I32(1), Scalar::I32(16), Scalar::I32(16)])
        );
    }

    #[test]
    fn list_element_failure_names_the_value() {
        let values = vec!["1".to_string(), "nope".to_string()];
        let err = convert("nums", &values, FieldType::List(ScalarKind::I32)).unwrap_err();
        match err {
            DispatchError::ValueConversion { value, .. } => assert_eq!(value, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_value_falls_back_to_empty() {
        let err = convert("age", &[], FieldType::Scalar(ScalarKind::I32)).unwrap_err();
        assert_eq!(err.code(), 1402);
        let text = convert("name", &[], FieldType::Scalar(ScalarKind::Text)).unwrap();
        assert_eq!(text, Value::Scalar(Scalar::Text(String::new())));
    }
}
