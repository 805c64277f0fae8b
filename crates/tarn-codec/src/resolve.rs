//! Implicit tag resolution for plain scalars, YAML 1.1 rules.

use crate::value::Value;

pub const TAG_NULL: &str = "tag:yaml.org,2002:null";
pub const TAG_BOOL: &str = "tag:yaml.org,2002:bool";
pub const TAG_INT: &str = "tag:yaml.org,2002:int";
pub const TAG_FLOAT: &str = "tag:yaml.org,2002:float";
pub const TAG_STR: &str = "tag:yaml.org,2002:str";
pub const TAG_BINARY: &str = "tag:yaml.org,2002:binary";
pub const TAG_TIMESTAMP: &str = "tag:yaml.org,2002:timestamp";
pub const TAG_SEQ: &str = "tag:yaml.org,2002:seq";
pub const TAG_MAP: &str = "tag:yaml.org,2002:map";

/// Resolve scalar text to a canonical tag and a native value.
///
/// An empty or non-specific `tag` triggers implicit typing on `text`. An
/// explicit tag is honored when the text fits it; a mismatched explicit
/// tag keeps the string value under the given tag rather than failing.
/// `!!binary` text is returned as a string here; the decoder owns the
/// base64 step.
pub fn resolve(tag: &str, text: &str) -> (String, Value) {
    if !tag.is_empty() && tag != "!" {
        let value = match tag {
            TAG_NULL => Some(Value::Null),
            TAG_BOOL => parse_bool(text).map(Value::Bool),
            TAG_INT => parse_int(text).map(Value::Int),
            TAG_FLOAT => parse_float(text).map(Value::Float),
            TAG_STR | TAG_BINARY | TAG_TIMESTAMP => Some(Value::Str(text.to_string())),
            _ => None,
        };
        return match value {
            Some(value) => (tag.to_string(), value),
            None => (tag.to_string(), Value::Str(text.to_string())),
        };
    }

    if is_null(text) {
        return (TAG_NULL.to_string(), Value::Null);
    }
    if let Some(b) = parse_bool(text) {
        return (TAG_BOOL.to_string(), Value::Bool(b));
    }
    if let Some(i) = parse_int(text) {
        return (TAG_INT.to_string(), Value::Int(i));
    }
    if let Some(f) = parse_float(text) {
        return (TAG_FLOAT.to_string(), Value::Float(f));
    }
    if is_timestamp(text) {
        return (TAG_TIMESTAMP.to_string(), Value::Str(text.to_string()));
    }
    (TAG_STR.to_string(), Value::Str(text.to_string()))
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "y" | "Y" | "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => {
            Some(true)
        }
        "n" | "N" | "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => {
            Some(false)
        }
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest.is_empty() {
        return None;
    }
    let (radix, digits) = if let Some(d) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = rest.strip_prefix("0b") {
        (2, d)
    } else if let Some(d) = rest.strip_prefix("0o") {
        (8, d)
    } else if rest != "0" && rest.starts_with('0') && rest.chars().all(|c| c.is_digit(8) || c == '_') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return None;
    }
    let magnitude = i64::from_str_radix(&cleaned, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    // Must look like a number, not just parse as one: reject forms the
    // plain-string rules should keep (e.g. "nan", "1e", leading dots are
    // fine: ".5").
    let body = text.trim_start_matches(['-', '+']);
    if body.is_empty() || !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !text.contains(['.', 'e', 'E']) {
        return None;
    }
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned.parse().ok()
}

/// ISO-8601 shape check; the value stays textual under `!!timestamp`.
fn is_timestamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    let date_shaped = bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit);
    date_shaped && (bytes.len() == 10 || matches!(bytes[10], b'T' | b't' | b' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_of(text: &str) -> String {
        resolve("", text).0
    }

    #[test]
    fn nulls() {
        for text in ["", "~", "null", "Null", "NULL"] {
            assert_eq!(resolve("", text), (TAG_NULL.to_string(), Value::Null));
        }
    }

    #[test]
    fn bools_include_yaml_1_1_words() {
        assert_eq!(resolve("", "yes").1, Value::Bool(true));
        assert_eq!(resolve("", "Off").1, Value::Bool(false));
        assert_eq!(resolve("", "TRUE").1, Value::Bool(true));
        assert_eq!(tag_of("yep"), TAG_STR);
    }

    #[test]
    fn integers() {
        assert_eq!(resolve("", "123").1, Value::Int(123));
        assert_eq!(resolve("", "-7").1, Value::Int(-7));
        assert_eq!(resolve("", "+7").1, Value::Int(7));
        assert_eq!(resolve("", "0x1F").1, Value::Int(31));
        assert_eq!(resolve("", "0b101").1, Value::Int(5));
        assert_eq!(resolve("", "0o17").1, Value::Int(15));
        assert_eq!(resolve("", "010").1, Value::Int(8));
        assert_eq!(resolve("", "1_000").1, Value::Int(1000));
        assert_eq!(tag_of("12ab"), TAG_STR);
        assert_eq!(tag_of("_1"), TAG_STR);
    }

    #[test]
    fn floats() {
        assert_eq!(resolve("", "1.5").1, Value::Float(1.5));
        assert_eq!(resolve("", "-2e3").1, Value::Float(-2000.0));
        assert_eq!(resolve("", ".inf").1, Value::Float(f64::INFINITY));
        assert_eq!(resolve("", "-.inf").1, Value::Float(f64::NEG_INFINITY));
        assert!(matches!(resolve("", ".nan").1, Value::Float(f) if f.is_nan()));
        assert_eq!(tag_of("nan"), TAG_STR);
        assert_eq!(tag_of("1e"), TAG_STR);
    }

    #[test]
    fn timestamps_stay_textual() {
        let (tag, value) = resolve("", "2024-08-30");
        assert_eq!(tag, TAG_TIMESTAMP);
        assert_eq!(value, Value::Str("2024-08-30".into()));
        assert_eq!(tag_of("2024-08-30T12:00:00Z"), TAG_TIMESTAMP);
        assert_eq!(tag_of("2024-08"), TAG_STR);
    }

    #[test]
    fn explicit_tags_are_honored() {
        assert_eq!(
            resolve(TAG_STR, "123"),
            (TAG_STR.to_string(), Value::Str("123".into()))
        );
        assert_eq!(resolve(TAG_INT, "42").1, Value::Int(42));
        assert_eq!(resolve(TAG_NULL, "whatever").1, Value::Null);
    }

    #[test]
    fn mismatched_explicit_tag_keeps_the_string() {
        assert_eq!(
            resolve(TAG_INT, "not-a-number"),
            (TAG_INT.to_string(), Value::Str("not-a-number".into()))
        );
        assert_eq!(
            resolve("!custom", "payload"),
            ("!custom".to_string(), Value::Str("payload".into()))
        );
    }

    #[test]
    fn non_specific_tag_resolves_implicitly() {
        assert_eq!(resolve("!", "123").1, Value::Int(123));
    }
}
