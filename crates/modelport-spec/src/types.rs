//! Declared-type vocabulary: maps wire-type names plus heuristic signals to
//! the four parameter kinds a generated function can carry.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::catalog::SignatureEntry;

/// The closed set of parameter kinds.
///
/// Kind is fixed once inference completes; each kind has exactly one
/// serialization arm in the runtime crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Bool,
    Date,
}

/// Textual array wrappers: `array<T>`, `array(T)`, `array[T]`.
static ARRAY_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^array\s*(?:<\s*([^>]+?)\s*>|\(\s*([^)]+?)\s*\)|\[\s*([^\]]+?)\s*\])")
        .expect("array type pattern must compile")
});

/// Date-shaped strings: `yyyy-mm-dd` / `yyyy/mm/dd`, optional time suffix.
static DATE_STRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}[-/]\d{2}[-/]\d{2}([ T].*)?$").expect("date string pattern must compile")
});

/// Classify a declared wire type plus heuristic signals into a parameter
/// kind and array flag.
///
/// Array wrappers unwrap one level and classify the element type with the
/// array flag set. Without a declared type the sample's runtime shape
/// decides. Unrecognized names fall back to sniffing the sample.
pub fn classify(
    declared: Option<&str>,
    field_name: &str,
    sample: Option<&JsonValue>,
) -> (ParamKind, bool) {
    let declared = declared.map(str::trim).filter(|s| !s.is_empty());

    if let Some(decl) = declared {
        if let Some(caps) = ARRAY_TYPE_RE.captures(decl) {
            let element = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str());
            let (kind, _) = classify(element, field_name, sample);
            return (kind, true);
        }
        // Bare collection token with no element type in the name itself;
        // tensor dtypes and `items` entries are unwrapped by `classify_entry`.
        if decl.eq_ignore_ascii_case("array") || decl.eq_ignore_ascii_case("tensor") {
            let (kind, _) = classify(None, field_name, None);
            return (kind, true);
        }
        return (base_kind(decl, field_name, sample), false);
    }

    match sample {
        Some(JsonValue::Array(items)) => {
            let kind = element_kind(items).unwrap_or(ParamKind::String);
            (kind, true)
        }
        _ => (kind_from_sample(field_name, sample), false),
    }
}

/// Classify one signature entry, unwrapping tensor-spec dtypes and
/// `items` element declarations before delegating to [`classify`].
pub fn classify_entry(entry: &SignatureEntry, sample: Option<&JsonValue>) -> (ParamKind, bool) {
    let declared = entry
        .declared_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(decl) = declared {
        if decl.eq_ignore_ascii_case("tensor") {
            let dtype = entry.tensor_spec.as_ref().and_then(|t| t.dtype.as_deref());
            let (kind, _) = classify(dtype, &entry.name, None);
            return (kind, true);
        }
        if decl.eq_ignore_ascii_case("array") {
            let item_type = entry.items.as_ref().and_then(item_type_name);
            let (kind, _) = classify(item_type.as_deref(), &entry.name, None);
            return (kind, true);
        }
    }

    classify(declared, &entry.name, sample)
}

/// An `items` declaration is either a mapping carrying a `type` key or a
/// bare type-name string.
fn item_type_name(items: &JsonValue) -> Option<String> {
    match items {
        JsonValue::Object(map) => map
            .get("type")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        JsonValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Fixed base-type table.
fn base_kind(decl: &str, field_name: &str, sample: Option<&JsonValue>) -> ParamKind {
    match decl.to_ascii_lowercase().as_str() {
        "boolean" | "bool" => ParamKind::Bool,
        "integer" | "long" | "int" | "short" => ParamKind::Number,
        "double" | "float" | "float32" | "float64" => ParamKind::Number,
        "date" | "datetime" => ParamKind::Date,
        "string" | "str" => {
            if is_date_field(field_name, sample) {
                ParamKind::Date
            } else {
                ParamKind::String
            }
        }
        _ => kind_from_sample(field_name, sample),
    }
}

/// Generic fallback: sniff the sample's runtime type.
fn kind_from_sample(field_name: &str, sample: Option<&JsonValue>) -> ParamKind {
    match sample {
        Some(JsonValue::Bool(_)) => ParamKind::Bool,
        Some(JsonValue::Number(_)) => ParamKind::Number,
        Some(JsonValue::String(_)) => {
            if is_date_field(field_name, sample) {
                ParamKind::Date
            } else {
                ParamKind::String
            }
        }
        _ => ParamKind::String,
    }
}

/// Element kind for list samples: the first scalar found decides, nested
/// lists are descended, and unresolvable elements (null/object) leave the
/// choice to the caller.
fn element_kind(items: &[JsonValue]) -> Option<ParamKind> {
    for item in items {
        match item {
            JsonValue::Array(nested) => {
                if let Some(kind) = element_kind(nested) {
                    return Some(kind);
                }
            }
            JsonValue::Bool(_) => return Some(ParamKind::Bool),
            JsonValue::Number(_) => return Some(ParamKind::Number),
            JsonValue::String(_) => return Some(ParamKind::String),
            _ => return None,
        }
    }
    None
}

/// Date heuristic: the field name, tokenized on case boundaries and
/// non-alphanumerics, contains `date`/`dt`/`dob`; or the sample is a
/// date-shaped string. May override a declared `string`, never an explicit
/// non-string type.
pub fn is_date_field(field_name: &str, sample: Option<&JsonValue>) -> bool {
    if split_name_tokens(field_name)
        .iter()
        .any(|t| matches!(t.as_str(), "date" | "dt" | "dob"))
    {
        return true;
    }
    matches!(sample, Some(JsonValue::String(s)) if looks_like_date_string(s))
}

pub(crate) fn looks_like_date_string(value: &str) -> bool {
    DATE_STRING_RE.is_match(value.trim())
}

/// Split a field name into lowercase tokens: `startDate` → `[start, date]`,
/// `DOBDate` → `[dob, date]`, `value_dt` → `[value, dt]`, `q1` → `[q, 1]`.
fn split_name_tokens(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for i in 0..chars.len() {
        let c = chars[i];
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let acronym_end = c.is_ascii_uppercase()
                && prev.is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let case_boundary =
                c.is_ascii_uppercase() && (prev.is_ascii_lowercase() || prev.is_ascii_digit());
            let digit_boundary = (c.is_ascii_digit() && prev.is_ascii_alphabetic())
                || (c.is_ascii_alphabetic() && prev.is_ascii_digit());
            if acronym_end || case_boundary || digit_boundary {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_table_is_fixed() {
        for decl in ["boolean", "bool", "BOOL"] {
            assert_eq!(classify(Some(decl), "x", None), (ParamKind::Bool, false));
        }
        for decl in ["integer", "long", "int", "short", "double", "float", "float32", "float64"] {
            assert_eq!(classify(Some(decl), "x", None), (ParamKind::Number, false));
        }
        for decl in ["date", "datetime"] {
            assert_eq!(classify(Some(decl), "x", None), (ParamKind::Date, false));
        }
        assert_eq!(classify(Some("string"), "x", None), (ParamKind::String, false));
    }

    #[test]
    fn declared_type_ignores_sample() {
        let sample = json!("2023-03-15");
        // An explicit non-string type is never overridden by the heuristic.
        assert_eq!(
            classify(Some("double"), "trade_date", Some(&sample)),
            (ParamKind::Number, false)
        );
    }

    #[test]
    fn date_heuristic_overrides_string() {
        assert_eq!(classify(Some("string"), "startDate", None), (ParamKind::Date, false));
        assert_eq!(classify(Some("string"), "value_dt", None), (ParamKind::Date, false));
        assert_eq!(classify(Some("string"), "DOB", None), (ParamKind::Date, false));
        let sample = json!("2023-03-15T12:00:00");
        assert_eq!(
            classify(Some("string"), "when", Some(&sample)),
            (ParamKind::Date, false)
        );
        assert_eq!(classify(Some("string"), "update", None), (ParamKind::String, false));
    }

    #[test]
    fn array_wrappers_unwrap_one_level() {
        assert_eq!(classify(Some("array<double>"), "xs", None), (ParamKind::Number, true));
        assert_eq!(classify(Some("array(long)"), "xs", None), (ParamKind::Number, true));
        assert_eq!(classify(Some("array[bool]"), "flags", None), (ParamKind::Bool, true));
        assert_eq!(
            classify(Some("array<string>"), "value_date", None),
            (ParamKind::Date, true)
        );
        // Exact tokens only: "dates" does not fire the heuristic.
        assert_eq!(
            classify(Some("array<string>"), "value_dates", None),
            (ParamKind::String, true)
        );
    }

    #[test]
    fn sample_shape_decides_without_declared_type() {
        assert_eq!(classify(None, "x", Some(&json!(true))), (ParamKind::Bool, false));
        assert_eq!(classify(None, "x", Some(&json!(3.5))), (ParamKind::Number, false));
        assert_eq!(classify(None, "x", Some(&json!("hi"))), (ParamKind::String, false));
        assert_eq!(classify(None, "x", Some(&json!([1, 2]))), (ParamKind::Number, true));
        assert_eq!(
            classify(None, "x", Some(&json!([[null], [2.0]]))),
            (ParamKind::Number, true)
        );
        assert_eq!(classify(None, "x", Some(&json!([]))), (ParamKind::String, true));
        assert_eq!(classify(None, "x", None), (ParamKind::String, false));
    }

    #[test]
    fn unrecognized_declared_type_sniffs_sample() {
        assert_eq!(
            classify(Some("object"), "x", Some(&json!(true))),
            (ParamKind::Bool, false)
        );
        assert_eq!(
            classify(Some("decimal128"), "x", Some(&json!(9.5))),
            (ParamKind::Number, false)
        );
        assert_eq!(classify(Some("object"), "x", None), (ParamKind::String, false));
    }

    #[test]
    fn tokenizer_splits_case_and_separators() {
        assert_eq!(split_name_tokens("startDate"), ["start", "date"]);
        assert_eq!(split_name_tokens("DOBDate"), ["dob", "date"]);
        assert_eq!(split_name_tokens("trade_dt"), ["trade", "dt"]);
        assert_eq!(split_name_tokens("q1"), ["q", "1"]);
        assert_eq!(split_name_tokens("updated"), ["updated"]);
        assert!(!is_date_field("updated", None));
    }

    #[test]
    fn date_string_shapes() {
        assert!(looks_like_date_string("2023-03-15"));
        assert!(looks_like_date_string("2023/03/15"));
        assert!(looks_like_date_string("2023-03-15 10:30:00"));
        assert!(looks_like_date_string("2023-03-15T10:30:00"));
        assert!(!looks_like_date_string("15-03-2023"));
        assert!(!looks_like_date_string("20230315"));
    }
}
